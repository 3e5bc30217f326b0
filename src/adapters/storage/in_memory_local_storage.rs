//! In-Memory Local Storage Adapter
//!
//! Stores values in a map. Useful for testing and development.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::ports::{LocalStorage, StorageError};

/// In-memory key/value storage
///
/// Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLocalStorage {
    items: Arc<Mutex<HashMap<String, String>>>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryLocalStorage {
    /// Create an empty storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a storage pre-populated with one entry
    pub fn with_item(self, key: &str, value: &str) -> Self {
        self.items().insert(key.to_string(), value.to_string());
        self
    }

    /// Make subsequent writes and removals fail (simulates a full quota)
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    /// Raw value for a key, bypassing the port
    pub fn peek(&self, key: &str) -> Option<String> {
        self.items().get(key).cloned()
    }

    fn items(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.items
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_writable(&self) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(StorageError::Unavailable("storage quota exceeded".to_string()))
        } else {
            Ok(())
        }
    }
}

impl LocalStorage for InMemoryLocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_writable()?;
        self.items().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.check_writable()?;
        self.items().remove(key);
        Ok(())
    }
}
