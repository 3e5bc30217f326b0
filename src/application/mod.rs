//! Application layer - AI client, history store and the wizard.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Screens call into [`DecisionWizard`]; everything else is wired behind it.

pub mod ai_client;
pub mod errors;
pub mod history;
pub mod json_extract;
pub mod prompts;
pub mod wizard;

pub use ai_client::DecisionAiClient;
pub use errors::{ErrorKind, ErrorStage, GenieError, KeySource, StageError};
pub use history::{HistoryExport, HistoryStore, ImportReport};
pub use json_extract::{extract_json, ExtractedJson};
pub use wizard::{Activity, BusyFlags, DecisionWizard, WizardSnapshot};
