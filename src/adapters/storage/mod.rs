//! Storage Adapters
//!
//! Implementations of the LocalStorage port.
//!
//! ## Available Adapters
//!
//! - **FileLocalStorage** - Stores all keys in one JSON file on disk
//! - **InMemoryLocalStorage** - Stores keys in memory (testing/development)
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::{FileLocalStorage, InMemoryLocalStorage};
//!
//! // Production: file-based storage
//! let storage = FileLocalStorage::in_dir("./.decision-genie");
//!
//! // Testing: in-memory storage
//! let storage = InMemoryLocalStorage::new();
//! ```

mod file_local_storage;
mod in_memory_local_storage;

pub use file_local_storage::{FileLocalStorage, LOCAL_STORAGE_FILE};
pub use in_memory_local_storage::InMemoryLocalStorage;
