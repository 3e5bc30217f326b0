//! AI Provider Adapters.
//!
//! Implementations of the AIProvider and ModelConnector ports.
//!
//! ## Available Adapters
//!
//! - `GeminiProvider` - Google generative-language REST API
//! - `GeminiConnector` - Builds a `GeminiProvider` for the active key
//! - `MockAIProvider` / `MockConnector` - Configurable mocks for testing

mod gemini_provider;
mod mock_provider;

pub use gemini_provider::{
    GeminiConfig, GeminiConnector, GeminiProvider, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL,
};
pub use mock_provider::{MockAIProvider, MockConnector, MockError, MockResponse};
