use clap::ValueEnum;
use serde::Serialize;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1000;

/// What to do with a ZIP locale row that has no city/state columns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShortRowPolicy {
    /// Abort the run
    #[default]
    Fail,
    /// Log a warning and write the row with empty MHA columns
    Warn,
}

/// Where the enriched table ends up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Write next to the ZIP file, then rename over it
    InPlace,
    /// Write to a distinct file; the ZIP file is left untouched
    Separate(PathBuf),
}

/// Parameters for one enrichment pass
#[derive(Debug, Clone)]
pub struct JoinConfig {
    pub zip_path: PathBuf,
    pub target: OutputTarget,
    pub short_rows: ShortRowPolicy,
    pub progress_interval: u64,
}

impl JoinConfig {
    /// In-place enrichment of `zip_path` with default policies
    pub fn in_place(zip_path: impl Into<PathBuf>) -> Self {
        Self {
            zip_path: zip_path.into(),
            target: OutputTarget::InPlace,
            short_rows: ShortRowPolicy::default(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    /// Enrichment of `zip_path` into `output` with default policies
    pub fn to_output(zip_path: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            target: OutputTarget::Separate(output.into()),
            ..Self::in_place(zip_path)
        }
    }

    pub fn with_short_rows(mut self, policy: ShortRowPolicy) -> Self {
        self.short_rows = policy;
        self
    }

    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval;
        self
    }

    /// True when the enriched table replaces `zip_path`, including an
    /// `OutputTarget::Separate` path that resolves to the same file.
    pub fn is_in_place(&self) -> bool {
        match &self.target {
            OutputTarget::InPlace => true,
            OutputTarget::Separate(path) => same_file(path, &self.zip_path),
        }
    }

    /// Path the enriched rows are written to
    pub fn write_path(&self) -> PathBuf {
        match &self.target {
            OutputTarget::Separate(path) if !self.is_in_place() => path.clone(),
            _ => staging_path(&self.zip_path),
        }
    }
}

/// Whether two paths name the same file, after resolving `..` and symlinks.
/// A path that does not exist yet never matches.
pub fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// `ZIP_Locale_Detail.csv` -> `ZIP_Locale_Detail_new.csv` in the same directory
pub fn staging_path(path: &Path) -> PathBuf {
    let mut name: OsString = path
        .file_stem()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("output"));
    name.push("_new");
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }
    path.with_file_name(name)
}
