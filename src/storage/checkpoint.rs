//! Persisted progress cursor for resumable harvests.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

/// Errors reading or writing the checkpoint file.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Failed to access checkpoint {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Checkpoint {path} is corrupt: expected 8 bytes, found {len}")]
    Corrupt { path: PathBuf, len: usize },
}

/// Single-integer checkpoint stored as 8 little-endian bytes.
///
/// Writes go to a temporary file in the same directory which is then renamed
/// over the old one, so a reader sees either the old or the new value.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored cursor, or 0 when no checkpoint has been written yet.
    pub fn load(&self) -> Result<u64, CheckpointError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(self.io_error(e)),
        };

        let raw: [u8; 8] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| CheckpointError::Corrupt {
                path: self.path.clone(),
                len: bytes.len(),
            })?;
        Ok(u64::from_le_bytes(raw))
    }

    /// Replace the stored cursor with `value`.
    pub fn save(&self, value: u64) -> Result<(), CheckpointError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| self.io_error(e))?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| self.io_error(e))?;
        tmp.write_all(&value.to_le_bytes())
            .map_err(|e| self.io_error(e))?;
        tmp.as_file().sync_all().map_err(|e| self.io_error(e))?;
        tmp.persist(&self.path)
            .map_err(|e| self.io_error(e.error))?;

        debug!("Checkpoint {} -> {}", self.path.display(), value);
        Ok(())
    }

    fn io_error(&self, source: io::Error) -> CheckpointError {
        CheckpointError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_absent_checkpoint_is_zero() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("cursor.bin"));
        assert_eq!(store.load().unwrap(), 0);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("cursor.bin"));

        store.save(42).unwrap();
        assert_eq!(store.load().unwrap(), 42);

        store.save(12831).unwrap();
        assert_eq!(store.load().unwrap(), 12831);
    }

    #[test]
    fn test_save_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("nested/out/cursor.bin"));
        store.save(7).unwrap();
        assert_eq!(CheckpointStore::new(store.path()).load().unwrap(), 7);
    }

    #[test]
    fn test_corrupt_checkpoint() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cursor.bin");
        std::fs::write(&path, b"abc").unwrap();

        let err = CheckpointStore::new(&path).load().unwrap_err();
        assert!(matches!(err, CheckpointError::Corrupt { len: 3, .. }));
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("cursor.bin"));
        for i in 0..5 {
            store.save(i).unwrap();
        }
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
