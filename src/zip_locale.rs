//! ZIP locale enrichment pass
//!
//! Streams `ZIP_Locale_Detail.csv` row by row, appends `MHA_CODE` and
//! `MHA_NAME` from the MHA lookup and writes every row, matched or not, to
//! the output. In-place runs write to a `_new` sibling first and rename it
//! over the original in one step.

use crate::config::{JoinConfig, ShortRowPolicy};
use crate::error::{Error, Result};
use crate::mha_lookup::MhaLookup;
use crate::models::{MhaKey, MHA_CODE_COLUMN, MHA_NAME_COLUMN, ZIP_CITY_INDEX, ZIP_STATE_INDEX};
use crate::progress::ProgressObserver;
use csv::{ByteRecord, ReaderBuilder, WriterBuilder};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Short rows logged individually before only counting them
const MAX_SHORT_ROW_WARNINGS: u64 = 5;

/// Outcome of one enrichment pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JoinSummary {
    /// Data rows read and written (header excluded)
    pub rows: u64,
    pub matched: u64,
    pub unmatched: u64,
    /// Rows passed through without a lookup under `ShortRowPolicy::Warn`
    pub short_rows: u64,
    /// Final location of the enriched table, if it went to disk
    pub output: Option<PathBuf>,
    pub replaced_input: bool,
}

/// Enrich the ZIP locale file named in `config` and put the result in place.
pub fn enrich<P>(lookup: &MhaLookup, config: &JoinConfig, progress: &mut P) -> Result<JoinSummary>
where
    P: ProgressObserver + ?Sized,
{
    let input_path = config.zip_path.as_path();
    let write_path = config.write_path();
    let in_place = config.is_in_place();

    // Input first: a missing ZIP file must not leave an output file behind
    let reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(input_path)
        .map_err(|source| Error::Open {
            path: input_path.to_path_buf(),
            source,
        })?;

    if !in_place {
        if let Some(parent) = write_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| Error::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    let writer = WriterBuilder::new()
        .flexible(true)
        .from_path(&write_path)
        .map_err(|source| Error::Create {
            path: write_path.clone(),
            source,
        })?;
    info!("Writing enriched rows to {}", write_path.display());

    // Both handles are consumed and closed here, before any rename
    let mut summary = stream(
        lookup,
        reader,
        writer,
        config.short_rows,
        config.progress_interval,
        progress,
        (input_path, write_path.as_path()),
    )?;
    info!("Finished writing {}", write_path.display());

    if in_place {
        replace(&write_path, input_path)?;
        summary.output = Some(input_path.to_path_buf());
        summary.replaced_input = true;
    } else {
        summary.output = Some(write_path);
    }

    Ok(summary)
}

/// Enrich CSV data from `input` into `output` without touching the filesystem.
pub fn enrich_reader<R, W, P>(
    lookup: &MhaLookup,
    input: R,
    output: W,
    short_rows: ShortRowPolicy,
    progress_interval: u64,
    progress: &mut P,
) -> Result<JoinSummary>
where
    R: io::Read,
    W: io::Write,
    P: ProgressObserver + ?Sized,
{
    let reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input);
    let writer = WriterBuilder::new().flexible(true).from_writer(output);
    stream(
        lookup,
        reader,
        writer,
        short_rows,
        progress_interval,
        progress,
        (Path::new("<input>"), Path::new("<output>")),
    )
}

fn stream<R, W, P>(
    lookup: &MhaLookup,
    mut reader: csv::Reader<R>,
    mut writer: csv::Writer<W>,
    short_rows: ShortRowPolicy,
    progress_interval: u64,
    progress: &mut P,
    (input_path, output_path): (&Path, &Path),
) -> Result<JoinSummary>
where
    R: io::Read,
    W: io::Write,
    P: ProgressObserver + ?Sized,
{
    let read_err = |source| Error::Csv {
        path: input_path.to_path_buf(),
        source,
    };
    let write_err = |source| Error::Csv {
        path: output_path.to_path_buf(),
        source,
    };
    let interval = progress_interval.max(1);

    let mut header = reader.byte_headers().map_err(read_err)?.clone();
    if header.is_empty() {
        return Err(Error::MissingHeader {
            path: input_path.to_path_buf(),
        });
    }
    header.push_field(MHA_CODE_COLUMN.as_bytes());
    header.push_field(MHA_NAME_COLUMN.as_bytes());
    writer.write_byte_record(&header).map_err(write_err)?;
    debug!("Header written ({} columns)", header.len());

    let mut summary = JoinSummary::default();
    let mut record = ByteRecord::new();
    while reader.read_byte_record(&mut record).map_err(read_err)? {
        let row = summary.rows + 1;

        let mha = match (record.get(ZIP_CITY_INDEX), record.get(ZIP_STATE_INDEX)) {
            (Some(city), Some(state)) => {
                let key = MhaKey::new(
                    &String::from_utf8_lossy(state),
                    &String::from_utf8_lossy(city),
                );
                let found = lookup.get_key(&key);
                if found.is_some() {
                    summary.matched += 1;
                } else {
                    summary.unmatched += 1;
                }
                found
            }
            _ => match short_rows {
                ShortRowPolicy::Fail => {
                    return Err(Error::ShortRow {
                        row,
                        fields: record.len(),
                    });
                }
                ShortRowPolicy::Warn => {
                    summary.short_rows += 1;
                    if summary.short_rows <= MAX_SHORT_ROW_WARNINGS {
                        warn!(
                            "Row {} has {} fields, writing it without MHA columns",
                            row,
                            record.len()
                        );
                    }
                    None
                }
            },
        };

        match mha {
            Some(mha) => {
                record.push_field(mha.code.as_bytes());
                record.push_field(mha.name.as_bytes());
            }
            None => {
                record.push_field(b"");
                record.push_field(b"");
            }
        }
        writer.write_byte_record(&record).map_err(write_err)?;
        summary.rows = row;

        if row % interval == 0 {
            progress.on_progress(row);
        }
    }

    writer.flush().map_err(|source| Error::Io {
        path: output_path.to_path_buf(),
        source,
    })?;

    if summary.short_rows > MAX_SHORT_ROW_WARNINGS {
        warn!("{} short rows in total", summary.short_rows);
    }
    info!(
        "Joined {} rows: {} matched, {} unmatched, {} short",
        summary.rows, summary.matched, summary.unmatched, summary.short_rows
    );

    Ok(summary)
}

/// Move `from` over `to` with a single rename, replacing `to` if it exists.
fn replace(from: &Path, to: &Path) -> Result<()> {
    fs::rename(from, to).map_err(|source| Error::Swap {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    })?;
    info!("Replaced {} with enriched table", to.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;

    fn lookup() -> MhaLookup {
        MhaLookup::from_reader("CODE,NAME\n101,\"Fort Bragg, NC\"\n".as_bytes()).unwrap()
    }

    fn run(input: &str, policy: ShortRowPolicy) -> Result<(JoinSummary, String)> {
        let mut out = Vec::new();
        let summary = enrich_reader(&lookup(), input.as_bytes(), &mut out, policy, 1000, &mut NoProgress)?;
        Ok((summary, String::from_utf8(out).unwrap()))
    }

    #[test]
    fn test_end_to_end_example() {
        let input = "ZIP,TYPE,CITY,STATE\n28307,MIL,Fort Bragg,NC\n90210,CIV,Beverly Hills,CA\n";
        let (summary, output) = run(input, ShortRowPolicy::Fail).unwrap();

        assert_eq!(
            output,
            "ZIP,TYPE,CITY,STATE,MHA_CODE,MHA_NAME\n\
             28307,MIL,Fort Bragg,NC,101,\"Fort Bragg, NC\"\n\
             90210,CIV,Beverly Hills,CA,,\n"
        );
        assert_eq!(summary.rows, 2);
        assert_eq!(summary.matched, 1);
        assert_eq!(summary.unmatched, 1);
        assert_eq!(summary.output, None);
    }

    #[test]
    fn test_lookup_trims_but_output_is_verbatim() {
        let input = "ZIP,TYPE,CITY,STATE,COUNTY\n28307,MIL, Fort Bragg , NC ,Cumberland\n";
        let (summary, output) = run(input, ShortRowPolicy::Fail).unwrap();

        assert_eq!(summary.matched, 1);
        assert_eq!(
            output.lines().nth(1).unwrap(),
            "28307,MIL, Fort Bragg , NC ,Cumberland,101,\"Fort Bragg, NC\""
        );
    }

    #[test]
    fn test_header_only_input() {
        let (summary, output) = run("ZIP,TYPE,CITY,STATE\n", ShortRowPolicy::Fail).unwrap();
        assert_eq!(summary.rows, 0);
        assert_eq!(output, "ZIP,TYPE,CITY,STATE,MHA_CODE,MHA_NAME\n");
    }

    #[test]
    fn test_empty_input_has_no_header() {
        let err = run("", ShortRowPolicy::Fail).unwrap_err();
        assert!(matches!(err, Error::MissingHeader { .. }));
    }

    #[test]
    fn test_short_row_fails_fast() {
        let input = "ZIP,TYPE,CITY,STATE\n28307,MIL,Fort Bragg,NC\n90210,CIV,Beverly Hills\n";
        let err = run(input, ShortRowPolicy::Fail).unwrap_err();
        assert!(matches!(err, Error::ShortRow { row: 2, fields: 3 }));
    }

    #[test]
    fn test_short_row_warns_and_passes_through() {
        let input = "ZIP,TYPE,CITY,STATE\n90210,CIV,Beverly Hills\n28307,MIL,Fort Bragg,NC\n";
        let (summary, output) = run(input, ShortRowPolicy::Warn).unwrap();

        assert_eq!(summary.rows, 2);
        assert_eq!(summary.short_rows, 1);
        assert_eq!(summary.matched, 1);
        assert_eq!(summary.unmatched, 0);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[1], "90210,CIV,Beverly Hills,,");
        assert_eq!(lines[2], "28307,MIL,Fort Bragg,NC,101,\"Fort Bragg, NC\"");
    }

    #[test]
    fn test_blank_lines_are_not_rows() {
        // The csv reader drops empty lines, so they never reach the row policy
        let input = "ZIP,TYPE,CITY,STATE\n28307,MIL,Fort Bragg,NC\n\n90210,CIV,Beverly Hills,CA\n";
        let (summary, output) = run(input, ShortRowPolicy::Fail).unwrap();

        assert_eq!(summary.rows, 2);
        assert_eq!(summary.short_rows, 0);
        assert_eq!(output.lines().count(), 3);
    }

    #[test]
    fn test_failed_replace_keeps_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("zips.csv");
        fs::write(&target, "ZIP,TYPE,CITY,STATE\n").unwrap();

        let err = replace(&dir.path().join("zips_new.csv"), &target).unwrap_err();

        assert!(matches!(err, Error::Swap { .. }));
        assert_eq!(fs::read_to_string(&target).unwrap(), "ZIP,TYPE,CITY,STATE\n");
    }

    #[test]
    fn test_progress_fires_on_interval() {
        let mut input = String::from("ZIP,TYPE,CITY,STATE\n");
        for i in 0..2500 {
            input.push_str(&format!("{:05},STD,Town {},TX\n", i, i));
        }

        let mut seen = Vec::new();
        let mut observer = |rows: u64| seen.push(rows);
        let summary = enrich_reader(
            &lookup(),
            input.as_bytes(),
            io::sink(),
            ShortRowPolicy::Fail,
            1000,
            &mut observer,
        )
        .unwrap();

        assert_eq!(summary.rows, 2500);
        assert_eq!(seen, vec![1000, 2000]);
    }
}
