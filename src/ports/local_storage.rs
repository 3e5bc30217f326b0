//! Local Storage Port - Interface for the device's key/value store.
//!
//! Holds the user-provided API key and the serialized decision history.
//! Values are opaque strings; callers own their encoding.

/// Errors that can occur during local storage operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Failed to serialize storage: {0}")]
    SerializationFailed(String),

    #[error("Storage is unavailable: {0}")]
    Unavailable(String),
}

/// Port for a synchronous, string-keyed local store.
pub trait LocalStorage: Send + Sync {
    /// Returns the stored value, or `None` when the key is absent.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores a value, replacing any previous one.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes a key. Removing an absent key is not an error.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// Storage key for the user-provided API key.
pub const USER_API_KEY_STORAGE_KEY: &str = "decisionGenieUserApiKey";

/// Storage key for the serialized decision history.
pub const DECISION_HISTORY_KEY: &str = "decisionGenieHistory";
