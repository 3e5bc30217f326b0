//! AI Provider Port - Interface for generative-model integrations.
//!
//! This port abstracts the single-prompt generation calls the decision
//! assistant makes, so the application layer never touches HTTP or a
//! vendor's wire format.
//!
//! # Design
//!
//! - One prompt in, one text (plus optional search citations) out
//! - Per-call temperature and response mode (plain text or JSON)
//! - Optional web-search grounding, surfaced as [`Citation`]s
//! - A [`ModelConnector`] builds providers from an API key at runtime,
//!   because the key can change while the program runs
//!
//! # Example
//!
//! ```ignore
//! use async_trait::async_trait;
//!
//! struct EchoProvider;
//!
//! #[async_trait]
//! impl AIProvider for EchoProvider {
//!     async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, AIError> {
//!         Ok(GenerateResponse::text(request.prompt, "echo"))
//!     }
//!
//!     fn provider_info(&self) -> ProviderInfo {
//!         ProviderInfo::new("echo", "echo")
//!     }
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Port for generative-model interactions.
#[async_trait]
pub trait AIProvider: Send + Sync {
    /// Generate a single response for one prompt.
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, AIError>;

    /// Get provider information (name, model).
    fn provider_info(&self) -> ProviderInfo;
}

/// Builds an [`AIProvider`] bound to a specific API key.
///
/// Connecting performs no network traffic; a bad key surfaces on the first
/// call as [`AIError::AuthenticationFailed`].
pub trait ModelConnector: Send + Sync {
    fn connect(&self, api_key: &str) -> Result<Arc<dyn AIProvider>, AIError>;
}

/// Shape the model is asked to answer in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
    /// Free-form text.
    #[default]
    Text,
    /// The model is instructed to emit a JSON document.
    Json,
}

/// Request for a single generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    /// Full prompt text.
    pub prompt: String,
    /// Sampling temperature; provider default when unset.
    pub temperature: Option<f32>,
    /// Requested response shape.
    pub response_mode: ResponseMode,
    /// Whether the model may consult web search and return citations.
    pub search_grounding: bool,
}

impl GenerateRequest {
    /// Creates a plain-text request with provider defaults.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            temperature: None,
            response_mode: ResponseMode::Text,
            search_grounding: false,
        }
    }

    /// Sets the temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Asks for a JSON document.
    pub fn expecting_json(mut self) -> Self {
        self.response_mode = ResponseMode::Json;
        self
    }

    /// Enables web-search grounding.
    pub fn with_search_grounding(mut self) -> Self {
        self.search_grounding = true;
        self
    }
}

/// A web source the model consulted while answering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub uri: String,
    pub title: Option<String>,
}

impl Citation {
    pub fn new(uri: impl Into<String>, title: Option<String>) -> Self {
        Self {
            uri: uri.into(),
            title,
        }
    }
}

/// Response from a generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateResponse {
    /// Generated text, possibly empty.
    pub text: String,
    /// Search citations; empty unless grounding was requested.
    pub citations: Vec<Citation>,
    /// Model that generated the response.
    pub model: String,
    /// Why the model stopped generating.
    pub finish_reason: FinishReason,
}

impl GenerateResponse {
    /// Creates a text-only response that stopped naturally.
    pub fn text(text: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            citations: Vec::new(),
            model: model.into(),
            finish_reason: FinishReason::Stop,
        }
    }

    /// Attaches citations.
    pub fn with_citations(mut self, citations: Vec<Citation>) -> Self {
        self.citations = citations;
        self
    }
}

/// Reason the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural stop (end of response).
    Stop,
    /// Hit the output token limit.
    Length,
    /// Content was filtered for safety.
    ContentFilter,
    /// Anything the provider reports that we do not model.
    Other,
}

/// Provider information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// Provider name (e.g., "gemini").
    pub name: String,
    /// Model identifier (e.g., "gemini-2.5-flash").
    pub model: String,
    /// Whether web-search grounding is supported.
    pub supports_search: bool,
}

impl ProviderInfo {
    /// Creates new provider info.
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            supports_search: false,
        }
    }

    /// Sets search grounding support.
    pub fn with_search(mut self, supports: bool) -> Self {
        self.supports_search = supports;
        self
    }
}

/// AI provider errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AIError {
    /// API key missing, rejected or revoked.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Usage quota for the key is exhausted.
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Rate limited by provider.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds until retry is allowed.
        retry_after_secs: u32,
    },

    /// Network error during request.
    #[error("network error: {0}")]
    Network(String),

    /// Request timed out.
    #[error("request timed out after {timeout_secs}s")]
    Timeout {
        /// Configured timeout.
        timeout_secs: u32,
    },

    /// Provider is unavailable.
    #[error("provider unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },

    /// Invalid request configuration.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Failed to parse provider response.
    #[error("parse error: {0}")]
    Parse(String),
}

impl AIError {
    /// Creates a quota exceeded error.
    pub fn quota_exceeded(message: impl Into<String>) -> Self {
        Self::QuotaExceeded(message.into())
    }

    /// Creates a rate limited error.
    pub fn rate_limited(retry_after_secs: u32) -> Self {
        Self::RateLimited { retry_after_secs }
    }

    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Creates an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }
}
