//! MHA reference table loading
//!
//! Reads `mha_data.csv` (column 0 = MHA code, column 1 = "City, State") into
//! an in-memory map keyed by `(state, city)`. The whole table is held in
//! memory for the duration of the ZIP locale pass.

use crate::error::{Error, Result};
use crate::models::{split_name, MhaKey, MhaRecord};
use csv::{ReaderBuilder, StringRecord};
use serde::Serialize;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Counters gathered while loading the MHA table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LookupStats {
    pub rows_read: u64,
    pub entries: usize,
    pub short_rows: u64,
    pub names_without_comma: u64,
    pub duplicate_keys: u64,
}

/// `(state, city)` -> MHA record mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MhaLookup {
    entries: HashMap<MhaKey, MhaRecord>,
    stats: LookupStats,
}

impl MhaLookup {
    /// Load the MHA table from a CSV file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(|source| Error::Open {
                path: path.to_path_buf(),
                source,
            })?;
        Self::load(reader, path)
    }

    /// Load the MHA table from any reader, e.g. an in-memory buffer
    pub fn from_reader<R: io::Read>(rdr: R) -> Result<Self> {
        let reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(rdr);
        Self::load(reader, Path::new("<reader>"))
    }

    fn load<R: io::Read>(mut reader: csv::Reader<R>, path: &Path) -> Result<Self> {
        let csv_err = |source| Error::Csv {
            path: PathBuf::from(path),
            source,
        };

        // Header is skipped unconditionally, but still has to parse
        reader.headers().map_err(csv_err)?;

        let mut lookup = MhaLookup::default();
        let mut record = StringRecord::new();
        while reader.read_record(&mut record).map_err(csv_err)? {
            lookup.stats.rows_read += 1;
            lookup.ingest(&record);
        }
        lookup.stats.entries = lookup.entries.len();

        debug!(
            "Loaded {} MHA entries from {} rows ({} short, {} without comma, {} duplicate keys)",
            lookup.stats.entries,
            lookup.stats.rows_read,
            lookup.stats.short_rows,
            lookup.stats.names_without_comma,
            lookup.stats.duplicate_keys
        );

        Ok(lookup)
    }

    fn ingest(&mut self, record: &StringRecord) {
        let (Some(code), Some(name)) = (record.get(0), record.get(1)) else {
            self.stats.short_rows += 1;
            return;
        };
        let code = code.trim();
        let name = name.trim();

        let Some((city, state)) = split_name(name) else {
            self.stats.names_without_comma += 1;
            return;
        };

        let key = MhaKey::new(state, city);
        let entry = MhaRecord {
            code: code.to_string(),
            name: name.to_string(),
        };
        // Later rows win
        if let Some(previous) = self.entries.insert(key, entry) {
            self.stats.duplicate_keys += 1;
            debug!("Duplicate MHA key for {:?}, replacing code {}", name, previous.code);
        }
    }

    pub fn get(&self, state: &str, city: &str) -> Option<&MhaRecord> {
        self.entries.get(&MhaKey::new(state, city))
    }

    pub fn get_key(&self, key: &MhaKey) -> Option<&MhaRecord> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> &LookupStats {
        &self.stats
    }
}
