//! State machine trait for step enums.
//!
//! Provides a consistent interface for validating and performing state
//! transitions on a plain discriminant enum.

use super::ValidationError;

/// Trait for enums that represent state machines.
///
/// Implementors define valid state transitions and get validated
/// transition methods for free.
///
/// # Example
///
/// ```ignore
/// impl StateMachine for StepKind {
///     fn can_transition_to(&self, target: &Self) -> bool {
///         self.valid_transitions().contains(target)
///     }
///
///     fn valid_transitions(&self) -> Vec<Self> {
///         match self {
///             Welcome => vec![ShowingSuggestions, AskingProblem, ShowingHistory],
///             // ... etc
///         }
///     }
/// }
///
/// let next = current.transition_to(StepKind::AskingProblem)?;
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Performs transition with validation, returning error if invalid.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_format(
                "state_transition",
                format!("Cannot transition from {:?} to {:?}", self, target),
            ))
        }
    }
}
