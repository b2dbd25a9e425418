//! Adds Military Housing Area columns to the ZIP locale table
//!
//! Usage:
//!   cargo run --release --bin update_zip_locale -- [OPTIONS]
//!
//! Options:
//!   --mha <PATH>                MHA reference table (default: mha_data.csv)
//!   --zip <PATH>                ZIP locale table to enrich (default: ZIP_Locale_Detail.csv)
//!   --output <PATH>             Write to a separate file instead of replacing --zip
//!   --short-rows <fail|warn>    Rows without city/state columns (default: fail)
//!   --progress-interval <N>     Log every N rows (default: 1000)
//!   --summary <PATH>            Write the run summary as JSON

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use zip_locale_mha::config::DEFAULT_PROGRESS_INTERVAL;
use zip_locale_mha::{enrich, JoinConfig, JoinSummary, LogProgress, LookupStats, MhaLookup, ShortRowPolicy};

#[derive(Parser, Debug)]
#[command(name = "update_zip_locale")]
#[command(about = "Join MHA codes onto the ZIP locale table by (state, city)")]
struct Args {
    /// MHA reference CSV (code, "City, State")
    #[arg(long, default_value = "mha_data.csv")]
    mha: PathBuf,

    /// ZIP locale CSV (city at column 2, state at column 3)
    #[arg(long, default_value = "ZIP_Locale_Detail.csv")]
    zip: PathBuf,

    /// Output CSV path; the ZIP file is replaced in place when omitted
    #[arg(long)]
    output: Option<PathBuf>,

    /// Handling of ZIP rows with fewer than 4 columns
    #[arg(long, value_enum, default_value_t = ShortRowPolicy::Fail)]
    short_rows: ShortRowPolicy,

    /// Rows between progress log lines
    #[arg(long, default_value_t = DEFAULT_PROGRESS_INTERVAL, value_parser = clap::value_parser!(u64).range(1..))]
    progress_interval: u64,

    /// Write a JSON run summary to this path
    #[arg(long)]
    summary: Option<PathBuf>,
}

impl Args {
    fn join_config(&self) -> JoinConfig {
        let config = match &self.output {
            Some(output) => JoinConfig::to_output(&self.zip, output),
            None => JoinConfig::in_place(&self.zip),
        };
        config
            .with_short_rows(self.short_rows)
            .with_progress_interval(self.progress_interval)
    }
}

#[derive(Debug, Serialize)]
struct RunReport<'a> {
    mha_path: &'a PathBuf,
    zip_path: &'a PathBuf,
    lookup: &'a LookupStats,
    join: &'a JoinSummary,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    info!("Starting MHA enrichment of {}", args.zip.display());

    let lookup = MhaLookup::from_path(&args.mha)
        .with_context(|| format!("building MHA lookup from {}", args.mha.display()))?;
    info!(
        "MHA mapping created: {} entries from {}",
        lookup.len(),
        args.mha.display()
    );

    let config = args.join_config();
    let summary = enrich(&lookup, &config, &mut LogProgress)
        .with_context(|| format!("enriching {}", args.zip.display()))?;

    if let Some(output) = &summary.output {
        info!(
            "Wrote {} rows ({} matched) to {}",
            summary.rows,
            summary.matched,
            output.display()
        );
    }

    if let Some(path) = &args.summary {
        let report = RunReport {
            mha_path: &args.mha,
            zip_path: &args.zip,
            lookup: lookup.stats(),
            join: &summary,
        };
        let json = serde_json::to_string_pretty(&report)?;
        fs::write(path, json).with_context(|| format!("writing summary to {}", path.display()))?;
        info!("Summary written to {}", path.display());
    }

    Ok(())
}
