//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## AI Ports
//!
//! - `AIProvider` - Single-prompt generation against a model
//! - `ModelConnector` - Builds an `AIProvider` from an API key
//!
//! ## Storage Ports
//!
//! - `LocalStorage` - String key/value store for the API key and history

mod ai_provider;
mod local_storage;

pub use ai_provider::{
    AIError, AIProvider, Citation, FinishReason, GenerateRequest, GenerateResponse,
    ModelConnector, ProviderInfo, ResponseMode,
};
pub use local_storage::{
    LocalStorage, StorageError, DECISION_HISTORY_KEY, USER_API_KEY_STORAGE_KEY,
};
