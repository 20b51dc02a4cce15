//! Append-only CSV record files.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::models::Record;

/// Errors writing harvested records.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write CSV record to {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// An append-only CSV file holding records of type `R`.
///
/// Opening the sink creates the file with `R::HEADER` as its first line when
/// it does not exist yet. Each `append` writes exactly one line and syncs it
/// to disk before returning, so a crash loses at most the record in flight.
pub struct RecordSink<R: Record> {
    path: PathBuf,
    writer: csv::Writer<File>,
    _record: PhantomData<fn(&R)>,
}

impl<R: Record> RecordSink<R> {
    /// Open `path` for appending, initialising it with the header if needed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let path = path.into();
        let io_err = |source| SinkError::Io {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let created = !path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(&path)
            .map_err(io_err)?;

        if !created {
            trim_torn_tail(&file, &path).map_err(io_err)?;
        }

        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        let mut sink = Self {
            path,
            writer,
            _record: PhantomData,
        };

        if created || sink.is_empty()? {
            info!("Created {}", sink.path.display());
            sink.write_row(R::HEADER.iter().map(|h| h.to_string()).collect())?;
        }

        Ok(sink)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record.
    pub fn append(&mut self, record: &R) -> Result<(), SinkError> {
        self.write_row(record.fields())
    }

    fn write_row(&mut self, fields: Vec<String>) -> Result<(), SinkError> {
        debug_assert_eq!(fields.len(), R::HEADER.len());
        self.writer
            .write_record(&fields)
            .map_err(|source| SinkError::Csv {
                path: self.path.clone(),
                source,
            })?;
        self.writer.flush().map_err(|source| SinkError::Io {
            path: self.path.clone(),
            source,
        })?;
        self.writer
            .get_ref()
            .sync_data()
            .map_err(|source| SinkError::Io {
                path: self.path.clone(),
                source,
            })
    }

    fn is_empty(&self) -> Result<bool, SinkError> {
        self.writer
            .get_ref()
            .metadata()
            .map(|m| m.len() == 0)
            .map_err(|source| SinkError::Io {
                path: self.path.clone(),
                source,
            })
    }
}

/// Drop a trailing partial line left behind by an interrupted write.
fn trim_torn_tail(file: &File, path: &Path) -> io::Result<()> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(());
    }

    let mut reader = file;
    reader.seek(SeekFrom::Start(0))?;
    let mut contents = Vec::with_capacity(len as usize);
    reader.read_to_end(&mut contents)?;

    if contents.last() == Some(&b'\n') {
        return Ok(());
    }

    let keep = contents
        .iter()
        .rposition(|b| *b == b'\n')
        .map(|i| i + 1)
        .unwrap_or(0);
    warn!(
        "Discarding {} bytes of incomplete trailing record in {}",
        contents.len() - keep,
        path.display()
    );
    file.set_len(keep as u64)?;
    file.sync_data()
}

/// Count data rows (excluding the header) in a record file.
pub fn count_records(path: &Path) -> Result<usize, SinkError> {
    if !path.exists() {
        return Ok(0);
    }
    let mut reader = csv::Reader::from_path(path).map_err(|source| SinkError::Csv {
        path: path.to_path_buf(),
        source,
    })?;
    let mut count = 0;
    for row in reader.records() {
        row.map_err(|source| SinkError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        count += 1;
    }
    Ok(count)
}
