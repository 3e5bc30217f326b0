//! Local storage configuration

use serde::Deserialize;
use std::path::PathBuf;

use crate::adapters::storage::LOCAL_STORAGE_FILE;

/// Where local data (saved key, history) is kept
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl StorageConfig {
    /// Path of the key/value file inside the data directory
    pub fn local_storage_path(&self) -> PathBuf {
        self.data_dir.join(LOCAL_STORAGE_FILE)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./.decision-genie")
}
