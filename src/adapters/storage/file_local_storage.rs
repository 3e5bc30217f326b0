//! File-based Local Storage Adapter
//!
//! Keeps every key in a single JSON object file, rewritten on each change.
//! Writes go to a sibling temp file first and are renamed into place.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::ports::{LocalStorage, StorageError};

/// File name used inside the data directory.
pub const LOCAL_STORAGE_FILE: &str = "local_storage.json";

/// File-backed key/value storage
#[derive(Debug)]
pub struct FileLocalStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    guard: Mutex<()>,
}

impl FileLocalStorage {
    /// Create a storage rooted in a data directory
    ///
    /// # Example
    /// ```ignore
    /// let storage = FileLocalStorage::in_dir("./.decision-genie");
    /// ```
    pub fn in_dir<P: AsRef<Path>>(data_dir: P) -> Self {
        Self::at_path(data_dir.as_ref().join(LOCAL_STORAGE_FILE))
    }

    /// Create a storage backed by an explicit file path
    pub fn at_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            guard: Mutex::new(()),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(StorageError::Io(e.to_string())),
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|e| StorageError::SerializationFailed(e.to_string()))
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| StorageError::Io(e.to_string()))?;
            }
        }
        let json = serde_json::to_string_pretty(map)
            .map_err(|e| StorageError::SerializationFailed(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| StorageError::Io(e.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|e| StorageError::Io(e.to_string()))
    }

    fn locked<T>(
        &self,
        f: impl FnOnce() -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let _guard = self
            .guard
            .lock()
            .map_err(|_| StorageError::Unavailable("storage lock poisoned".to_string()))?;
        f()
    }
}

impl LocalStorage for FileLocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.locked(|| Ok(self.read_map()?.remove(key)))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.locked(|| {
            let mut map = self.read_map()?;
            map.insert(key.to_string(), value.to_string());
            self.write_map(&map)
        })
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.locked(|| {
            let mut map = self.read_map()?;
            if map.remove(key).is_some() {
                self.write_map(&map)?;
            }
            Ok(())
        })
    }
}
