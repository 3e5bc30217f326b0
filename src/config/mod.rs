//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `DECISION_GENIE` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use decision_genie::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Using model {}", config.ai.model);
//! ```

mod ai;
mod error;
mod limits;
mod storage;

pub use ai::AiConfig;
pub use error::{ConfigError, ValidationError};
pub use limits::{LimitsConfig, MAX_LIMIT};
pub use storage::StorageConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults, so an empty environment loads successfully.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Gemini API configuration
    #[serde(default)]
    pub ai: AiConfig,

    /// Local data directory
    #[serde(default)]
    pub storage: StorageConfig,

    /// Session caps
    #[serde(default)]
    pub limits: LimitsConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `DECISION_GENIE` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `DECISION_GENIE__AI__API_KEY=...` -> `ai.api_key = ...`
    /// - `DECISION_GENIE__LIMITS__MAX_FOLLOW_UPS=5` -> `limits.max_follow_ups = 5`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("DECISION_GENIE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.ai.validate()?;
        self.limits.validate()?;
        Ok(())
    }
}
