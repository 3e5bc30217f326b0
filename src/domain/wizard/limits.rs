//! Per-session caps enforced client-side.

/// Caps on optional AI interactions within one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    /// How many times one decision may be regenerated.
    pub max_regenerations: u32,
    /// How many dynamic questions may be added to the initial batch.
    pub max_dynamic_questions: u32,
    /// How many follow-up questions may be asked about one decision.
    pub max_follow_ups: u32,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_regenerations: 1,
            max_dynamic_questions: 2,
            max_follow_ups: 3,
        }
    }
}
