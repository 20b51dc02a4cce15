//! On-disk harvest state: checkpoint cursor, record files and seen sets.

pub mod checkpoint;
pub mod seen;
pub mod sink;

use std::path::{Path, PathBuf};

pub use checkpoint::{CheckpointError, CheckpointStore};
pub use seen::SeenSet;
pub use sink::{count_records, RecordSink, SinkError};

/// Anime detail records.
pub const ANIME_DATA_FILE: &str = "anime_data.csv";
/// Number of anime detail records harvested so far.
pub const ANIME_CHECKPOINT_FILE: &str = "num_anime_scraped.bin";
/// Watch-list entries.
pub const USER_DATA_FILE: &str = "user_data.csv";
/// Usernames already visited.
pub const USERNAMES_FILE: &str = "usernames.csv";

/// Locations of the harvest files inside a data directory.
#[derive(Debug, Clone)]
pub struct HarvestPaths {
    pub data_dir: PathBuf,
}

impl HarvestPaths {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn anime_data(&self) -> PathBuf {
        self.data_dir.join(ANIME_DATA_FILE)
    }

    pub fn anime_checkpoint(&self) -> PathBuf {
        self.data_dir.join(ANIME_CHECKPOINT_FILE)
    }

    pub fn user_data(&self) -> PathBuf {
        self.data_dir.join(USER_DATA_FILE)
    }

    pub fn usernames(&self) -> PathBuf {
        self.data_dir.join(USERNAMES_FILE)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
