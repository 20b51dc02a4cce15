//! Persisted set of identifiers that have already been processed.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::sink::{RecordSink, SinkError};
use crate::models::SeenUser;

/// Deduplication set backed by a single-column CSV file.
///
/// The file is read once when the set is opened; every new identifier is
/// appended to it immediately so it survives an abort later in the run.
pub struct SeenSet {
    seen: HashSet<String>,
    sink: RecordSink<SeenUser>,
}

impl SeenSet {
    /// Load the set from `path`, creating the file if it does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let path = path.into();
        let sink = RecordSink::open(&path)?;
        let seen = read_identifiers(&path)?;
        debug!("Loaded {} seen identifiers from {}", seen.len(), path.display());
        Ok(Self { seen, sink })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Record `id` as processed. Returns `false` if it was already present.
    pub fn insert(&mut self, id: &str) -> Result<bool, SinkError> {
        if self.seen.contains(id) {
            return Ok(false);
        }
        self.sink.append(&SeenUser(id.to_string()))?;
        self.seen.insert(id.to_string());
        Ok(true)
    }
}

fn read_identifiers(path: &Path) -> Result<HashSet<String>, SinkError> {
    if !path.exists() {
        return Ok(HashSet::new());
    }
    let csv_err = |source| SinkError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(csv_err)?;

    let mut seen = HashSet::new();
    for row in reader.records() {
        let row = row.map_err(csv_err)?;
        if let Some(id) = row.get(0).map(str::trim).filter(|id| !id.is_empty()) {
            seen.insert(id.to_string());
        }
    }
    Ok(seen)
}
