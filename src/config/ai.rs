//! AI provider configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::ai::{GeminiConnector, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};

/// Gemini API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Environment-provided API key; takes precedence over a saved key
    pub api_key: Option<String>,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of the models endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Transport timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl AiConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The environment key, if one is set and non-blank
    pub fn env_api_key(&self) -> Option<String> {
        self.api_key
            .as_ref()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    }

    /// Connector that builds Gemini clients with these settings
    pub fn connector(&self) -> GeminiConnector {
        GeminiConnector::new(&self.model, &self.base_url, self.timeout())
    }

    /// Validate AI configuration
    ///
    /// A missing key is not an error here; it surfaces on first use.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.model.trim().is_empty() {
            return Err(ValidationError::MissingRequired("AI__MODEL"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidBaseUrl);
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_model() -> String {
    DEFAULT_GEMINI_MODEL.to_string()
}

fn default_base_url() -> String {
    DEFAULT_GEMINI_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    120
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_config_defaults() {
        let config = AiConfig::default();
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.timeout_secs, 120);
        assert!(config.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_timeout_duration() {
        let config = AiConfig {
            timeout_secs: 60,
            ..Default::default()
        };
        assert_eq!(config.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_blank_env_key_is_absent() {
        let config = AiConfig {
            api_key: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(config.env_api_key(), None);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let empty_model = AiConfig {
            model: " ".to_string(),
            ..Default::default()
        };
        assert!(empty_model.validate().is_err());

        let bad_url = AiConfig {
            base_url: "ftp://example.com".to_string(),
            ..Default::default()
        };
        assert!(matches!(bad_url.validate(), Err(ValidationError::InvalidBaseUrl)));

        let zero_timeout = AiConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(matches!(zero_timeout.validate(), Err(ValidationError::InvalidTimeout)));
    }
}
