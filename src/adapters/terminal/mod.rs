//! Terminal Adapter
//!
//! Line-based front end for the decision wizard.
//!
//! - **views** - pure screen rendering from a snapshot
//! - **input** - command parsing
//! - **TerminalSession** - read a line, apply it, render again

mod input;
mod views;

pub use input::Command;
pub use views::{
    error_panel, key_status_text, render, KEY_CLEARED, KEY_ENV_OVERRIDES, KEY_SAVED,
    KEY_SAVE_FAILED,
};

use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::application::{DecisionWizard, GenieError};
use crate::domain::wizard::WizardStep;

/// Whether the loop should keep reading input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Drives a [`DecisionWizard`] from line input.
pub struct TerminalSession {
    wizard: Arc<DecisionWizard>,
    export_dir: PathBuf,
}

impl TerminalSession {
    pub fn new(wizard: Arc<DecisionWizard>, export_dir: impl Into<PathBuf>) -> Self {
        Self {
            wizard,
            export_dir: export_dir.into(),
        }
    }

    /// Renders, reads and applies lines until `:q` or end of input.
    pub async fn run<R, W>(&self, reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        let mut notice: Option<String> = None;

        loop {
            let mut screen = String::new();
            if let Some(message) = notice.take() {
                screen.push_str(&format!("» {}\n\n", message));
            }
            screen.push_str(&render(&self.wizard.snapshot()));
            screen.push_str("> ");
            writer.write_all(screen.as_bytes()).await?;
            writer.flush().await?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let (flow, message) = self.apply_line(&line).await;
            notice = message;
            if flow == Flow::Quit {
                break;
            }
        }
        Ok(())
    }

    /// Parses `line` for the current screen and applies it.
    pub async fn apply_line(&self, line: &str) -> (Flow, Option<String>) {
        self.apply(Command::parse_for(self.wizard.step_kind(), line))
            .await
    }

    /// Applies one command to the wizard.
    ///
    /// Failures the wizard records on its own error channel show up in the
    /// next render; anything else is returned as a one-off notice.
    pub async fn apply(&self, command: Command) -> (Flow, Option<String>) {
        let wizard = &self.wizard;

        let result: Result<Option<String>, GenieError> = match command {
            Command::Quit => return (Flow::Quit, None),
            Command::SaveKey(key) => wizard.save_api_key(&key).map(|ready| {
                Some(if ready { KEY_SAVED } else { KEY_SAVE_FAILED }.to_string())
            }),
            Command::ClearKey => wizard.clear_api_key().map(|_| Some(KEY_CLEARED.to_string())),
            Command::Reset => {
                wizard.reset();
                Ok(None)
            }
            Command::Letter('c') if self.has_error() => {
                wizard.clear_error();
                wizard.clear_history_error();
                wizard.clear_follow_up_error();
                Ok(None)
            }
            command => self.apply_on_step(command).await,
        };

        match result {
            Ok(message) => (Flow::Continue, message),
            Err(err) => {
                tracing::debug!(error = %err, "command rejected");
                let snapshot = wizard.snapshot();
                let on_history = matches!(
                    snapshot.step,
                    WizardStep::ShowingHistory | WizardStep::ShowingHistoryDetail(_)
                );
                let follow_up_recorded = match &snapshot.step {
                    WizardStep::ShowingDecision { outcome, .. } => {
                        outcome.follow_up.last_error.is_some()
                    }
                    _ => false,
                };
                let recorded = snapshot.error.as_ref().map(|e| &e.error) == Some(&err)
                    || (on_history && snapshot.history_error.is_some())
                    || follow_up_recorded;
                (Flow::Continue, (!recorded).then(|| err.user_message()))
            }
        }
    }

    fn has_error(&self) -> bool {
        let snapshot = self.wizard.snapshot();
        let follow_up_error = match &snapshot.step {
            WizardStep::ShowingDecision { outcome, .. } => outcome.follow_up.last_error.is_some(),
            _ => false,
        };
        snapshot.error.is_some() || snapshot.history_error.is_some() || follow_up_error
    }

    async fn apply_on_step(&self, command: Command) -> Result<Option<String>, GenieError> {
        let wizard = &self.wizard;
        let snapshot = wizard.snapshot();

        match (&snapshot.step, command) {
            (WizardStep::Welcome, Command::Confirm) => wizard.start().await.map(|_| None),
            (WizardStep::Welcome, Command::Letter('h')) => wizard.show_history().map(|_| None),

            (WizardStep::ShowingSuggestions, Command::Pick(n)) => {
                wizard.select_suggestion(n - 1).await.map(|_| None)
            }
            (WizardStep::ShowingSuggestions, Command::Letter('m')) => {
                wizard.choose_manual_input().map(|_| None)
            }

            (WizardStep::AskingProblem, Command::Letter('b')) => {
                wizard.back_to_suggestions().await.map(|_| None)
            }
            (WizardStep::AskingProblem, Command::Confirm) => {
                wizard.submit_problem("").await.map(|_| None)
            }
            (WizardStep::AskingProblem, Command::Text(text)) => {
                wizard.submit_problem(&text).await.map(|_| None)
            }

            (WizardStep::AnsweringQuestions(session), Command::Pick(n)) => {
                let Some(question) = session.answers.unanswered(&session.questions).first().copied()
                else {
                    return Ok(None);
                };
                match question.options.get(n - 1) {
                    Some(option) => wizard.record_answer(&question.id, option).map(|_| None),
                    None => Ok(Some(format!("1부터 {} 사이의 번호를 입력해주세요.", question.options.len()))),
                }
            }
            (WizardStep::AnsweringQuestions(_), Command::Letter('+')) => {
                wizard.add_additional_question().await.map(|_| None)
            }
            (WizardStep::AnsweringQuestions(_), Command::Letter('s')) => {
                wizard.submit_answers().await.map(|_| None)
            }

            (WizardStep::ShowingDecision { .. }, Command::Letter('r')) => {
                wizard.regenerate_decision().await.map(|_| None)
            }
            (WizardStep::ShowingDecision { .. }, Command::FollowUp(query)) => {
                wizard.ask_follow_up(&query).await.map(|_| None)
            }
            (WizardStep::ShowingDecision { .. }, Command::Letter('w')) => {
                wizard.save_current_decision().map(|_| None)
            }
            (WizardStep::ShowingDecision { .. }, Command::Letter('n')) => {
                wizard.reset();
                Ok(None)
            }

            (WizardStep::ShowingHistory, Command::View(n)) => match snapshot.history.get(n - 1) {
                Some(saved) => wizard.show_history_detail(saved.id.as_str()).map(|_| None),
                None => Ok(None),
            },
            (WizardStep::ShowingHistory, Command::Delete(n)) => match snapshot.history.get(n - 1) {
                Some(saved) => wizard.delete_history_item(saved.id.as_str()).map(|_| None),
                None => Ok(None),
            },
            (WizardStep::ShowingHistory, Command::Letter('x')) => wizard
                .export_history(&self.export_dir)
                .map(|path| Some(format!("기록을 내보냈습니다: {}", path.display()))),
            (WizardStep::ShowingHistory, Command::Import(path)) => {
                wizard
                    .import_history_file(path)
                    .map(|report| (report.imported > 0).then(|| report.summary()))
            }
            (WizardStep::ShowingHistory, Command::Text(pasted)) if pasted.starts_with('[') => {
                wizard
                    .import_history_json(&pasted)
                    .map(|report| (report.imported > 0).then(|| report.summary()))
            }
            (WizardStep::ShowingHistory, Command::Letter('l')) => {
                wizard.back_to_welcome().map(|_| None)
            }
            (WizardStep::ShowingHistoryDetail(_), Command::Letter('b')) => {
                wizard.show_history().map(|_| None)
            }
            (WizardStep::ShowingHistoryDetail(saved), Command::Letter('d')) => {
                wizard.delete_history_item(saved.id.as_str()).map(|_| None)
            }

            _ => Ok(None),
        }
    }
}

impl std::fmt::Debug for TerminalSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalSession")
            .field("export_dir", &self.export_dir)
            .finish_non_exhaustive()
    }
}
