//! Mock AI Provider for testing.
//!
//! Provides a configurable mock implementation of the AIProvider port,
//! allowing tests to run without calling real AI APIs.
//!
//! # Features
//!
//! - Pre-configured responses, optionally with search citations
//! - Simulated delays for interleaving tests
//! - Error injection for resilience testing
//! - Call tracking for verification
//! - A [`MockConnector`] that hands out the same provider for any accepted key
//!
//! # Example
//!
//! ```ignore
//! let provider = MockAIProvider::new()
//!     .with_response(r#"{"decision": "..."}"#)
//!     .with_delay(Duration::from_millis(100));
//!
//! let response = provider.generate(request).await?;
//! ```

use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    AIError, AIProvider, Citation, FinishReason, GenerateRequest, GenerateResponse,
    ModelConnector, ProviderInfo,
};

/// Mock AI provider for testing.
///
/// Clones share the response queue and call history.
#[derive(Debug, Clone)]
pub struct MockAIProvider {
    /// Pre-configured responses (consumed in order).
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    /// Provider info to return.
    info: ProviderInfo,
    /// Simulated latency per request.
    delay: Duration,
    /// Call history for verification.
    calls: Arc<Mutex<Vec<GenerateRequest>>>,
}

/// A configured mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return a successful generation.
    Success {
        text: String,
        citations: Vec<Citation>,
    },
    /// Return empty text stopped by the safety filter.
    Blocked,
    /// Return an error.
    Error(MockError),
}

/// Mock error types for testing error handling.
#[derive(Debug, Clone)]
pub enum MockError {
    /// Simulate a rejected or revoked key.
    AuthenticationFailed,
    /// Simulate an exhausted quota.
    QuotaExceeded { message: String },
    /// Simulate rate limiting.
    RateLimited { retry_after_secs: u32 },
    /// Simulate provider unavailable.
    Unavailable { message: String },
    /// Simulate network error.
    Network { message: String },
    /// Simulate timeout.
    Timeout { timeout_secs: u32 },
}

impl From<MockError> for AIError {
    fn from(err: MockError) -> Self {
        match err {
            MockError::AuthenticationFailed => AIError::AuthenticationFailed,
            MockError::QuotaExceeded { message } => AIError::quota_exceeded(message),
            MockError::RateLimited { retry_after_secs } => AIError::rate_limited(retry_after_secs),
            MockError::Unavailable { message } => AIError::unavailable(message),
            MockError::Network { message } => AIError::network(message),
            MockError::Timeout { timeout_secs } => AIError::Timeout { timeout_secs },
        }
    }
}

/// Locks a mutex, recovering the data if a panicking test poisoned it.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Default for MockAIProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAIProvider {
    /// Creates a new mock provider with default settings.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            info: ProviderInfo::new("mock", "mock-model-1").with_search(true),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Adds a successful response to the queue.
    pub fn with_response(self, text: impl Into<String>) -> Self {
        self.with_cited_response(text, Vec::new())
    }

    /// Adds a successful response carrying search citations.
    pub fn with_cited_response(self, text: impl Into<String>, citations: Vec<Citation>) -> Self {
        self.push(MockResponse::Success {
            text: text.into(),
            citations,
        });
        self
    }

    /// Adds an error response to the queue.
    pub fn with_error(self, error: MockError) -> Self {
        self.push(MockResponse::Error(error));
        self
    }

    /// Queues an empty response blocked by the safety filter.
    pub fn with_blocked_response(self) -> Self {
        self.push(MockResponse::Blocked);
        self
    }

    /// Queues a response on a provider that is already shared.
    pub fn push(&self, response: MockResponse) {
        lock(&self.responses).push_back(response);
    }

    /// Sets simulated latency per request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sets the provider info.
    pub fn with_provider_info(mut self, info: ProviderInfo) -> Self {
        self.info = info;
        self
    }

    /// Returns the number of calls made to this provider.
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Returns all recorded calls.
    pub fn get_calls(&self) -> Vec<GenerateRequest> {
        lock(&self.calls).clone()
    }

    /// Returns the most recent call, if any.
    pub fn last_call(&self) -> Option<GenerateRequest> {
        lock(&self.calls).last().cloned()
    }

    /// Clears the call history.
    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    /// Number of queued responses not yet consumed.
    pub fn pending_responses(&self) -> usize {
        lock(&self.responses).len()
    }

    /// Gets the next response or a default.
    fn next_response(&self) -> MockResponse {
        lock(&self.responses)
            .pop_front()
            .unwrap_or_else(|| MockResponse::Success {
                text: "Mock response".to_string(),
                citations: Vec::new(),
            })
    }
}

#[async_trait]
impl AIProvider for MockAIProvider {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, AIError> {
        lock(&self.calls).push(request);

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        match self.next_response() {
            MockResponse::Success { text, citations } => Ok(GenerateResponse {
                text,
                citations,
                model: self.info.model.clone(),
                finish_reason: FinishReason::Stop,
            }),
            MockResponse::Blocked => Ok(GenerateResponse {
                text: String::new(),
                citations: Vec::new(),
                model: self.info.model.clone(),
                finish_reason: FinishReason::ContentFilter,
            }),
            MockResponse::Error(err) => Err(err.into()),
        }
    }

    fn provider_info(&self) -> ProviderInfo {
        self.info.clone()
    }
}

/// Connector that returns a shared [`MockAIProvider`] for accepted keys.
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    provider: MockAIProvider,
    rejected: Arc<Mutex<HashSet<String>>>,
    connected: Arc<Mutex<Vec<String>>>,
}

impl MockConnector {
    pub fn new(provider: MockAIProvider) -> Self {
        Self {
            provider,
            rejected: Arc::default(),
            connected: Arc::default(),
        }
    }

    /// Makes `connect` fail for this key.
    pub fn rejecting(self, key: impl Into<String>) -> Self {
        lock(&self.rejected).insert(key.into());
        self
    }

    /// The provider handed out on successful connects.
    pub fn provider(&self) -> &MockAIProvider {
        &self.provider
    }

    /// Keys that were successfully connected, in order.
    pub fn connected_keys(&self) -> Vec<String> {
        lock(&self.connected).clone()
    }
}

impl ModelConnector for MockConnector {
    fn connect(&self, api_key: &str) -> Result<Arc<dyn AIProvider>, AIError> {
        if api_key.trim().is_empty() || lock(&self.rejected).contains(api_key) {
            return Err(AIError::AuthenticationFailed);
        }
        lock(&self.connected).push(api_key.to_string());
        Ok(Arc::new(self.provider.clone()))
    }
}
