//! Gemini Provider - Implementation of AIProvider for Google's generative-language API.
//!
//! Calls the `generateContent` REST endpoint with a single user turn.
//!
//! # Configuration
//!
//! ```ignore
//! let config = GeminiConfig::new(api_key)
//!     .with_model("gemini-2.5-flash")
//!     .with_timeout(Duration::from_secs(120));
//!
//! let provider = GeminiProvider::new(config)?;
//! ```
//!
//! # Search grounding
//!
//! When a request asks for search grounding, the `googleSearch` tool is
//! attached and `groundingMetadata.groundingChunks[].web` entries come back
//! as [`Citation`]s.

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::ports::{
    AIError, AIProvider, Citation, FinishReason, GenerateRequest, GenerateResponse,
    ModelConnector, ProviderInfo, ResponseMode,
};

/// Default model when none is configured.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Default REST base for model endpoints.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Configuration for the Gemini provider.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Model to use (e.g., "gemini-2.5-flash").
    pub model: String,
    /// Base URL for model endpoints.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl GeminiConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Exposes the API key (for making requests).
    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// Gemini API provider implementation.
pub struct GeminiProvider {
    config: GeminiConfig,
    client: Client,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("model", &self.config.model)
            .field("base_url", &self.config.base_url)
            .finish()
    }
}

impl GeminiProvider {
    /// Creates a new Gemini provider with the given configuration.
    ///
    /// Fails when the key is blank or the HTTP client cannot be built.
    pub fn new(config: GeminiConfig) -> Result<Self, AIError> {
        if config.api_key().trim().is_empty() {
            return Err(AIError::AuthenticationFailed);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AIError::invalid_request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Builds the generateContent endpoint URL.
    fn generate_url(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    /// Sends a request and maps transport failures.
    async fn send_request(&self, body: &GeminiRequest) -> Result<Response, AIError> {
        self.client
            .post(self.generate_url())
            .header("x-goog-api-key", self.config.api_key())
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AIError::Timeout {
                        timeout_secs: self.config.timeout.as_secs() as u32,
                    }
                } else if e.is_connect() {
                    AIError::network(format!("Connection failed: {}", e))
                } else {
                    AIError::network(e.to_string())
                }
            })
    }

    /// Parses the API response status and handles errors.
    async fn handle_response_status(&self, response: Response) -> Result<Response, AIError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();
        Err(map_http_error(status.as_u16(), &error_body))
    }
}

#[async_trait]
impl AIProvider for GeminiProvider {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, AIError> {
        let body = GeminiRequest::from_request(&request);
        tracing::debug!(
            model = %self.config.model,
            json = request.response_mode == ResponseMode::Json,
            search = request.search_grounding,
            "sending generateContent request"
        );

        let response = self.send_request(&body).await?;
        let response = self.handle_response_status(response).await?;

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AIError::parse(format!("Failed to parse response: {}", e)))?;

        Ok(parsed.into_generate_response(&self.config.model))
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("gemini", &self.config.model).with_search(true)
    }
}

/// Builds [`GeminiProvider`]s for whichever key is currently active.
#[derive(Debug, Clone)]
pub struct GeminiConnector {
    model: String,
    base_url: String,
    timeout: Duration,
}

impl GeminiConnector {
    pub fn new(model: impl Into<String>, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            model: model.into(),
            base_url: base_url.into(),
            timeout,
        }
    }
}

impl Default for GeminiConnector {
    fn default() -> Self {
        Self::new(
            DEFAULT_GEMINI_MODEL,
            DEFAULT_GEMINI_BASE_URL,
            Duration::from_secs(120),
        )
    }
}

impl ModelConnector for GeminiConnector {
    fn connect(&self, api_key: &str) -> Result<Arc<dyn AIProvider>, AIError> {
        let config = GeminiConfig::new(api_key)
            .with_model(&self.model)
            .with_base_url(&self.base_url)
            .with_timeout(self.timeout);
        Ok(Arc::new(GeminiProvider::new(config)?))
    }
}

/// Maps a non-success HTTP status and body to an [`AIError`].
///
/// The structured `error.status` decides when present; the HTTP code and a
/// scan of the raw body are only used for bodies without one.
fn map_http_error(status: u16, body: &str) -> AIError {
    let parsed = serde_json::from_str::<GeminiErrorWrapper>(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|w| w.error.message.clone())
        .unwrap_or_else(|| body.to_string());

    if let Some(error) = parsed.as_ref().map(|w| &w.error) {
        let key_rejected = error
            .details
            .iter()
            .any(|d| d.reason.as_deref() == Some("API_KEY_INVALID"));
        match error.status.as_deref() {
            Some("UNAUTHENTICATED" | "PERMISSION_DENIED") => return AIError::AuthenticationFailed,
            Some("RESOURCE_EXHAUSTED") => return AIError::quota_exceeded(message),
            Some("INVALID_ARGUMENT") if key_rejected => return AIError::AuthenticationFailed,
            Some("INVALID_ARGUMENT" | "FAILED_PRECONDITION" | "NOT_FOUND") => {
                return AIError::invalid_request(message)
            }
            Some("UNAVAILABLE" | "INTERNAL" | "DEADLINE_EXCEEDED") => {
                return AIError::unavailable(format!("{}: {}", status, message))
            }
            Some(other) => {
                tracing::debug!(status = other, "unrecognized Gemini error status");
            }
            None if key_rejected => return AIError::AuthenticationFailed,
            None => {}
        }
    }

    let key_rejected = body.contains("API_KEY_INVALID") || body.contains("API key not valid");
    match status {
        401 | 403 => AIError::AuthenticationFailed,
        400 if key_rejected => AIError::AuthenticationFailed,
        429 => AIError::quota_exceeded(message),
        400 => AIError::invalid_request(message),
        500..=599 => AIError::unavailable(format!("Server error {}: {}", status, message)),
        _ => AIError::network(format!("Unexpected status {}: {}", status, message)),
    }
}

// ----- Gemini API Types -----

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<GeminiTool>,
}

impl GeminiRequest {
    fn from_request(request: &GenerateRequest) -> Self {
        let response_mime_type = match request.response_mode {
            ResponseMode::Json => Some("application/json".to_string()),
            ResponseMode::Text => None,
        };
        let generation_config = if request.temperature.is_some() || response_mime_type.is_some() {
            Some(GenerationConfig {
                temperature: request.temperature,
                response_mime_type,
            })
        } else {
            None
        };
        let tools = if request.search_grounding {
            vec![GeminiTool {
                google_search: serde_json::Map::new(),
            }]
        } else {
            Vec::new()
        };

        Self {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart {
                    text: request.prompt.clone(),
                }],
            }],
            generation_config,
            tools,
        }
    }
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    google_search: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    model_version: Option<String>,
}

impl GeminiResponse {
    fn into_generate_response(self, configured_model: &str) -> GenerateResponse {
        let model = self
            .model_version
            .unwrap_or_else(|| configured_model.to_string());
        let Some(candidate) = self.candidates.into_iter().next() else {
            return GenerateResponse {
                text: String::new(),
                citations: Vec::new(),
                model,
                finish_reason: FinishReason::Other,
            };
        };

        let text = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        let citations = candidate
            .grounding_metadata
            .map(|m| {
                m.grounding_chunks
                    .into_iter()
                    .filter_map(|chunk| chunk.web)
                    .filter_map(|web| {
                        web.uri
                            .filter(|uri| !uri.is_empty())
                            .map(|uri| Citation::new(uri, web.title.filter(|t| !t.is_empty())))
                    })
                    .collect()
            })
            .unwrap_or_default();

        let finish_reason = match candidate.finish_reason.as_deref() {
            Some("STOP") | None => FinishReason::Stop,
            Some("MAX_TOKENS") => FinishReason::Length,
            Some("SAFETY") | Some("BLOCKLIST") | Some("PROHIBITED_CONTENT") => {
                FinishReason::ContentFilter
            }
            Some(_) => FinishReason::Other,
        };

        GenerateResponse {
            text,
            citations,
            model,
            finish_reason,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContentResponse>,
    finish_reason: Option<String>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
struct GeminiPartResponse {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    web: Option<WebChunk>,
}

#[derive(Debug, Deserialize)]
struct WebChunk {
    uri: Option<String>,
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorWrapper {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: Option<String>,
    status: Option<String>,
    #[serde(default)]
    details: Vec<GeminiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    reason: Option<String>,
}
