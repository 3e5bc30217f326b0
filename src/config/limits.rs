//! Per-session interaction limits

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::wizard::SessionLimits;

/// Upper bound for any configured limit
pub const MAX_LIMIT: u32 = 10;

/// Session caps for regeneration, dynamic questions and follow-ups
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct LimitsConfig {
    #[serde(default = "default_max_regenerations")]
    pub max_regenerations: u32,

    #[serde(default = "default_max_dynamic_questions")]
    pub max_dynamic_questions: u32,

    #[serde(default = "default_max_follow_ups")]
    pub max_follow_ups: u32,
}

impl LimitsConfig {
    pub fn session_limits(&self) -> SessionLimits {
        SessionLimits {
            max_regenerations: self.max_regenerations,
            max_dynamic_questions: self.max_dynamic_questions,
            max_follow_ups: self.max_follow_ups,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for (name, value) in [
            ("max_regenerations", self.max_regenerations),
            ("max_dynamic_questions", self.max_dynamic_questions),
            ("max_follow_ups", self.max_follow_ups),
        ] {
            if value > MAX_LIMIT {
                return Err(ValidationError::LimitTooLarge(name));
            }
        }
        Ok(())
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_regenerations: default_max_regenerations(),
            max_dynamic_questions: default_max_dynamic_questions(),
            max_follow_ups: default_max_follow_ups(),
        }
    }
}

fn default_max_regenerations() -> u32 {
    SessionLimits::default().max_regenerations
}

fn default_max_dynamic_questions() -> u32 {
    SessionLimits::default().max_dynamic_questions
}

fn default_max_follow_ups() -> u32 {
    SessionLimits::default().max_follow_ups
}
