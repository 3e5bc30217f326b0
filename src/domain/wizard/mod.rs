//! Wizard module - the step sum type driving which screen is shown.

mod limits;
mod step;

pub use limits::SessionLimits;
pub use step::{DecisionOutcome, FollowUp, QuestionSession, StepKind, WizardStep};
