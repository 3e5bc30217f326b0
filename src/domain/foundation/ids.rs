//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Timestamp, ValidationError};

/// Identifier of a saved decision record.
///
/// New ids are derived from the save instant (Unix milliseconds as a decimal
/// string). Imported records keep whatever non-empty string they carry, so
/// the inner value is not guaranteed to be numeric.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SavedDecisionId(String);

impl SavedDecisionId {
    /// Creates an id from an existing string.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ValidationError::empty_field("id"));
        }
        Ok(Self(id))
    }

    /// Derives an id from a point in time.
    pub fn from_timestamp(at: &Timestamp) -> Self {
        Self(at.as_unix_millis().to_string())
    }

    /// Derives a time-based id that is not taken yet.
    ///
    /// Bumps the millisecond value until `is_taken` returns false.
    pub fn unique_from_timestamp(at: &Timestamp, is_taken: impl Fn(&SavedDecisionId) -> bool) -> Self {
        let mut millis = at.as_unix_millis();
        loop {
            let candidate = Self(millis.to_string());
            if !is_taken(&candidate) {
                return candidate;
            }
            millis += 1;
        }
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SavedDecisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
