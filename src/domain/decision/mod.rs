//! Decision module - questions, answers, recommendations and saved records.

mod question;
mod recommendation;
mod saved_decision;

pub use question::{ids_are_unique, AnswerMap, Question, MIN_OPTIONS};
pub use recommendation::{merge_links, AdditionalInfo, DecisionData, Link, LinkProvenance};
pub use saved_decision::{validate_saved_decision, SavedDecision};
