//! Decision wizard.
//!
//! Drives the step machine: user intents come in as method calls, AI and
//! history work is delegated to [`DecisionAiClient`] and [`HistoryStore`],
//! and the resulting state is read back through [`DecisionWizard::snapshot`].
//!
//! # Concurrency
//!
//! The state lock is never held across an AI call. Every navigation bumps an
//! epoch; a response that arrives after the epoch moved on is discarded.
//! Each activity has its own busy flag, so e.g. a pending follow-up does not
//! block adding a question on another screen.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use super::ai_client::DecisionAiClient;
use super::errors::{ErrorStage, GenieError, KeySource, StageError};
use super::history::{HistoryStore, ImportReport};
use crate::domain::decision::SavedDecision;
use crate::domain::foundation::{StateMachine, Timestamp};
use crate::domain::wizard::{DecisionOutcome, QuestionSession, SessionLimits, StepKind, WizardStep};

const EMPTY_PROBLEM: &str = "고민 내용을 입력해주세요.";
const NO_QUESTIONS: &str = "질문을 생성하지 못했습니다. 다른 고민으로 다시 시도해주세요.";
const UNKNOWN_SUGGESTION: &str = "선택한 고민을 찾을 수 없습니다.";
const UNANSWERED: &str = "모든 질문에 답변해주세요.";
const NO_MORE_REGENERATIONS: &str = "더 이상 결정을 다시 생성할 수 없습니다.";
const NO_MORE_FOLLOW_UPS: &str = "후속 질문 횟수를 모두 사용했습니다.";
const EMPTY_FOLLOW_UP: &str = "후속 질문을 입력해주세요.";
const NOTHING_TO_SAVE: &str = "저장할 결정 데이터가 충분하지 않습니다.";
const UNKNOWN_HISTORY_ITEM: &str = "선택한 기록을 찾을 수 없습니다.";

/// Independently tracked kinds of in-flight work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Activity {
    Suggestions,
    Questions,
    DynamicQuestion,
    Decision,
    FollowUp,
}

/// Which activities are currently waiting on the AI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusyFlags {
    pub suggestions: bool,
    pub questions: bool,
    pub dynamic_question: bool,
    pub decision: bool,
    pub follow_up: bool,
}

impl BusyFlags {
    pub fn any(&self) -> bool {
        self.suggestions || self.questions || self.dynamic_question || self.decision || self.follow_up
    }
}

/// Read-only copy of everything the screens render.
#[derive(Debug, Clone)]
pub struct WizardSnapshot {
    pub step: WizardStep,
    pub suggestions: Vec<String>,
    pub problem_draft: String,
    pub error: Option<StageError>,
    pub history_error: Option<String>,
    pub last_import: Option<ImportReport>,
    pub busy: BusyFlags,
    /// Saved decisions, newest first.
    pub history: Vec<SavedDecision>,
    pub has_stored_history: bool,
    /// Whether the AI client currently holds a usable handle.
    pub ai_ready: bool,
    pub key_source: KeySource,
    pub env_key_overrides_local: bool,
    pub limits: SessionLimits,
}

impl WizardSnapshot {
    pub fn can_regenerate(&self) -> bool {
        match &self.step {
            WizardStep::ShowingDecision { outcome, .. } => outcome.can_regenerate(&self.limits),
            _ => false,
        }
    }

    pub fn can_add_question(&self) -> bool {
        match &self.step {
            WizardStep::AnsweringQuestions(session) => session.can_add_question(&self.limits),
            _ => false,
        }
    }

    pub fn can_ask_follow_up(&self) -> bool {
        match &self.step {
            WizardStep::ShowingDecision { outcome, .. } => outcome.can_ask_follow_up(&self.limits),
            _ => false,
        }
    }

    /// True while the main screen should show a spinner.
    pub fn is_loading(&self) -> bool {
        self.step.is_loading() || self.busy.suggestions
    }
}

struct WizardState {
    step: WizardStep,
    suggestions: Vec<String>,
    problem_draft: String,
    error: Option<StageError>,
    history_error: Option<String>,
    last_import: Option<ImportReport>,
    epoch: u64,
    next_ticket: u64,
    in_flight: HashMap<Activity, u64>,
    history: HistoryStore,
}

impl WizardState {
    fn check(&self, action: &'static str, to: StepKind) -> Result<(), GenieError> {
        let from = self.step.kind();
        if from == to || from.can_transition_to(&to) {
            Ok(())
        } else {
            Err(GenieError::invalid_state(action, from))
        }
    }

    /// Moves to `next` and returns the new epoch.
    fn enter(&mut self, action: &'static str, next: WizardStep) -> Result<u64, GenieError> {
        self.check(action, next.kind())?;
        tracing::debug!(from = ?self.step.kind(), to = ?next.kind(), action, "wizard transition");
        self.step = next;
        self.epoch += 1;
        Ok(self.epoch)
    }

    fn begin(&mut self, activity: Activity) -> u64 {
        self.next_ticket += 1;
        self.in_flight.insert(activity, self.next_ticket);
        self.next_ticket
    }

    fn finish(&mut self, activity: Activity, ticket: u64) {
        if self.in_flight.get(&activity) == Some(&ticket) {
            self.in_flight.remove(&activity);
        }
    }

    fn is_busy(&self, activity: Activity) -> bool {
        self.in_flight.contains_key(&activity)
    }

    fn busy(&self) -> BusyFlags {
        BusyFlags {
            suggestions: self.is_busy(Activity::Suggestions),
            questions: self.is_busy(Activity::Questions),
            dynamic_question: self.is_busy(Activity::DynamicQuestion),
            decision: self.is_busy(Activity::Decision),
            follow_up: self.is_busy(Activity::FollowUp),
        }
    }

    /// Routes to `fallback` and records the error on the main channel.
    fn fail(&mut self, stage: ErrorStage, err: GenieError, fallback: WizardStep) -> Result<(), GenieError> {
        tracing::warn!(stage = ?stage, error = %err, "wizard action failed");
        self.enter("recover", fallback)?;
        self.error = Some(StageError::new(stage, err.clone()));
        Err(err)
    }

    fn clear_session(&mut self) {
        self.problem_draft.clear();
        self.error = None;
        self.in_flight.clear();
        self.epoch += 1;
    }
}

/// The decision wizard.
pub struct DecisionWizard {
    client: Arc<DecisionAiClient>,
    limits: SessionLimits,
    state: Mutex<WizardState>,
}

impl DecisionWizard {
    /// Creates a wizard on the welcome step and loads the stored history.
    pub fn new(client: Arc<DecisionAiClient>, mut history: HistoryStore, limits: SessionLimits) -> Self {
        let history_error = history.load().err().map(|e| e.user_message());
        Self {
            client,
            limits,
            state: Mutex::new(WizardState {
                step: WizardStep::Welcome,
                suggestions: Vec::new(),
                problem_draft: String::new(),
                error: None,
                history_error,
                last_import: None,
                epoch: 0,
                next_ticket: 0,
                in_flight: HashMap::new(),
                history,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, WizardState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn client(&self) -> &DecisionAiClient {
        &self.client
    }

    pub fn limits(&self) -> SessionLimits {
        self.limits
    }

    pub fn snapshot(&self) -> WizardSnapshot {
        let ai_ready = self.client.is_initialized();
        let key_source = self.client.api_key_source();
        let env_key_overrides_local = self.client.env_key_overrides_local();
        let s = self.lock();
        WizardSnapshot {
            step: s.step.clone(),
            suggestions: s.suggestions.clone(),
            problem_draft: s.problem_draft.clone(),
            error: s.error.clone(),
            history_error: s.history_error.clone(),
            last_import: s.last_import,
            busy: s.busy(),
            history: s.history.newest_first().into_iter().cloned().collect(),
            has_stored_history: s.history.has_stored_history(),
            ai_ready,
            key_source,
            env_key_overrides_local,
            limits: self.limits,
        }
    }

    pub fn step_kind(&self) -> StepKind {
        self.lock().step.kind()
    }

    /// Starts a new session by fetching problem suggestions.
    ///
    /// Lands on the suggestion list, or on free-text entry when there are
    /// none or the request failed.
    pub async fn start(&self) -> Result<(), GenieError> {
        {
            let s = self.lock();
            if s.step.kind() != StepKind::Welcome {
                return Err(GenieError::invalid_state("start", s.step.kind()));
            }
        }
        self.fetch_suggestions().await
    }

    async fn fetch_suggestions(&self) -> Result<(), GenieError> {
        let (epoch, ticket) = {
            let mut s = self.lock();
            s.clear_session();
            s.suggestions.clear();
            s.history_error = None;
            let ticket = s.begin(Activity::Suggestions);
            (s.epoch, ticket)
        };

        let result = self.client.suggest_problems().await;

        let mut s = self.lock();
        s.finish(Activity::Suggestions, ticket);
        if s.epoch != epoch {
            tracing::debug!("discarding stale suggestions");
            return Ok(());
        }
        match result {
            Ok(suggestions) if !suggestions.is_empty() => {
                s.suggestions = suggestions;
                s.enter("suggestions_ready", WizardStep::ShowingSuggestions)?;
                Ok(())
            }
            Ok(_) => {
                s.enter("suggestions_ready", WizardStep::AskingProblem)?;
                Ok(())
            }
            Err(err) => s.fail(ErrorStage::Suggestions, err, WizardStep::AskingProblem),
        }
    }

    /// Submits the suggestion at `index` as the problem.
    pub async fn select_suggestion(&self, index: usize) -> Result<(), GenieError> {
        let problem = {
            let s = self.lock();
            if s.step.kind() != StepKind::ShowingSuggestions {
                return Err(GenieError::invalid_state("select_suggestion", s.step.kind()));
            }
            s.suggestions.get(index).cloned()
        };
        match problem {
            Some(problem) => self.submit_problem(&problem).await,
            None => Err(GenieError::invalid_input(UNKNOWN_SUGGESTION)),
        }
    }

    /// Leaves the suggestion list for free-text problem entry.
    pub fn choose_manual_input(&self) -> Result<(), GenieError> {
        let mut s = self.lock();
        if s.step.kind() != StepKind::ShowingSuggestions {
            return Err(GenieError::invalid_state("choose_manual_input", s.step.kind()));
        }
        s.enter("choose_manual_input", WizardStep::AskingProblem)?;
        Ok(())
    }

    /// Discards any previous session and generates questions for `problem`.
    pub async fn submit_problem(&self, problem: &str) -> Result<(), GenieError> {
        let problem = problem.trim().to_string();
        let (epoch, ticket) = {
            let mut s = self.lock();
            s.check("submit_problem", StepKind::GeneratingQuestions)?;
            if problem.is_empty() {
                let err = GenieError::invalid_input(EMPTY_PROBLEM);
                s.error = Some(StageError::new(ErrorStage::Questions, err.clone()));
                return Err(err);
            }
            let epoch = s.enter(
                "submit_problem",
                WizardStep::GeneratingQuestions {
                    problem: problem.clone(),
                },
            )?;
            s.problem_draft = problem.clone();
            s.error = None;
            (epoch, s.begin(Activity::Questions))
        };

        let result = self.client.generate_questions(&problem).await;

        let mut s = self.lock();
        s.finish(Activity::Questions, ticket);
        if s.epoch != epoch {
            tracing::debug!("discarding stale questions");
            return Ok(());
        }
        match result {
            Ok(questions) if !questions.is_empty() => {
                tracing::info!(count = questions.len(), "questions generated");
                s.enter(
                    "questions_ready",
                    WizardStep::AnsweringQuestions(QuestionSession::new(problem, questions)),
                )?;
                Ok(())
            }
            Ok(_) => s.fail(
                ErrorStage::Questions,
                GenieError::empty_response(NO_QUESTIONS),
                WizardStep::AskingProblem,
            ),
            Err(err) => s.fail(ErrorStage::Questions, err, WizardStep::AskingProblem),
        }
    }

    /// Asks the model for one more question.
    ///
    /// At the cap, or after the model said it has nothing more, this is a
    /// no-op that makes no AI call.
    pub async fn add_additional_question(&self) -> Result<(), GenieError> {
        let limits = self.limits;
        let (epoch, ticket, problem, questions, answers, ordinal) = {
            let mut s = self.lock();
            let kind = s.step.kind();
            if s.is_busy(Activity::DynamicQuestion) {
                return Err(GenieError::invalid_state("add_question", kind));
            }
            let WizardStep::AnsweringQuestions(session) = &mut s.step else {
                return Err(GenieError::invalid_state("add_question", kind));
            };
            if !session.can_add_question(&limits) {
                session.no_more_questions = true;
                return Ok(());
            }
            let request = (
                session.problem.clone(),
                session.questions.clone(),
                session.answers.clone(),
                session.next_dynamic_ordinal(),
            );
            s.error = None;
            let ticket = s.begin(Activity::DynamicQuestion);
            (s.epoch, ticket, request.0, request.1, request.2, request.3)
        };

        let result = self
            .client
            .generate_single_additional_question(&problem, &questions, &answers, ordinal)
            .await;

        let mut s = self.lock();
        s.finish(Activity::DynamicQuestion, ticket);
        if s.epoch != epoch {
            tracing::debug!("discarding stale additional question");
            return Ok(());
        }
        let WizardStep::AnsweringQuestions(session) = &mut s.step else {
            return Ok(());
        };
        match result {
            Ok(Some(question)) if !session.questions.iter().any(|q| q.id == question.id) => {
                tracing::info!(id = %question.id, "additional question added");
                session.push_dynamic_question(question, &limits);
                Ok(())
            }
            Ok(_) => {
                tracing::info!("no more additional questions");
                session.no_more_questions = true;
                Ok(())
            }
            Err(err) => {
                session.no_more_questions = true;
                tracing::warn!(error = %err, "additional question failed");
                s.error = Some(StageError::new(ErrorStage::DynamicQuestion, err.clone()));
                Err(err)
            }
        }
    }

    /// Records the selected option for a question.
    pub fn record_answer(&self, question_id: &str, answer: &str) -> Result<(), GenieError> {
        let mut s = self.lock();
        let kind = s.step.kind();
        let WizardStep::AnsweringQuestions(session) = &mut s.step else {
            return Err(GenieError::invalid_state("record_answer", kind));
        };
        session.record_answer(question_id, answer)?;
        Ok(())
    }

    /// Requests the decision once every question has an answer.
    pub async fn submit_answers(&self) -> Result<(), GenieError> {
        let (session, epoch, ticket) = {
            let mut s = self.lock();
            let session = match &s.step {
                WizardStep::AnsweringQuestions(session) => session.clone(),
                other => return Err(GenieError::invalid_state("submit_answers", other.kind())),
            };
            if !session.is_fully_answered() {
                return Err(GenieError::invalid_input(UNANSWERED));
            }
            let epoch = s.enter("submit_answers", WizardStep::GeneratingDecision(session.clone()))?;
            s.error = None;
            (session, epoch, s.begin(Activity::Decision))
        };

        let result = self
            .client
            .make_decision(&session.problem, &session.answers, &session.questions, false, None)
            .await;

        let mut s = self.lock();
        s.finish(Activity::Decision, ticket);
        if s.epoch != epoch {
            tracing::debug!("discarding stale decision");
            return Ok(());
        }
        match result {
            Ok(decision) => {
                s.enter(
                    "decision_ready",
                    WizardStep::ShowingDecision {
                        session,
                        outcome: DecisionOutcome::new(decision),
                    },
                )?;
                Ok(())
            }
            Err(err) => s.fail(ErrorStage::Decision, err, WizardStep::AnsweringQuestions(session)),
        }
    }

    /// Whether the decision on screen may be regenerated.
    pub fn can_regenerate(&self) -> bool {
        match &self.lock().step {
            WizardStep::ShowingDecision { outcome, .. } => outcome.can_regenerate(&self.limits),
            _ => false,
        }
    }

    /// Asks for a different decision for the same answers.
    pub async fn regenerate_decision(&self) -> Result<(), GenieError> {
        let (session, previous, epoch, ticket) = {
            let mut s = self.lock();
            let (session, previous) = match &s.step {
                WizardStep::ShowingDecision { session, outcome } => (session.clone(), outcome.clone()),
                other => return Err(GenieError::invalid_state("regenerate", other.kind())),
            };
            if !previous.can_regenerate(&self.limits) {
                return Err(GenieError::invalid_input(NO_MORE_REGENERATIONS));
            }
            let epoch = s.enter(
                "regenerate",
                WizardStep::RegeneratingDecision {
                    session: session.clone(),
                    previous: previous.clone(),
                },
            )?;
            s.error = None;
            (session, previous, epoch, s.begin(Activity::Decision))
        };

        let result = self
            .client
            .make_decision(
                &session.problem,
                &session.answers,
                &session.questions,
                true,
                Some(&previous.decision.decision),
            )
            .await;

        let mut s = self.lock();
        s.finish(Activity::Decision, ticket);
        if s.epoch != epoch {
            tracing::debug!("discarding stale regenerated decision");
            return Ok(());
        }
        match result {
            Ok(decision) => {
                let outcome = previous.regenerated(decision);
                tracing::info!(regenerations = outcome.regenerations, "decision regenerated");
                s.enter("decision_ready", WizardStep::ShowingDecision { session, outcome })?;
                Ok(())
            }
            Err(err) => s.fail(
                ErrorStage::Regeneration,
                err,
                WizardStep::AnsweringQuestions(session),
            ),
        }
    }

    /// Asks a free-text question about the decision on screen.
    ///
    /// Failures go to the follow-up's own error slot, not the main channel.
    pub async fn ask_follow_up(&self, query: &str) -> Result<(), GenieError> {
        let query = query.trim().to_string();
        let (problem, decision, reasoning, epoch, ticket) = {
            let mut s = self.lock();
            let kind = s.step.kind();
            if s.is_busy(Activity::FollowUp) {
                return Err(GenieError::invalid_state("ask_follow_up", kind));
            }
            let WizardStep::ShowingDecision { session, outcome } = &mut s.step else {
                return Err(GenieError::invalid_state("ask_follow_up", kind));
            };
            if !outcome.can_ask_follow_up(&self.limits) {
                return Err(GenieError::invalid_input(NO_MORE_FOLLOW_UPS));
            }
            if query.is_empty() {
                return Err(GenieError::invalid_input(EMPTY_FOLLOW_UP));
            }
            outcome.follow_up.last_error = None;
            outcome.follow_up.last_answer = None;
            let request = (
                session.problem.clone(),
                outcome.decision.decision.clone(),
                outcome.decision.reasoning.clone(),
            );
            let ticket = s.begin(Activity::FollowUp);
            (request.0, request.1, request.2, s.epoch, ticket)
        };

        let result = self
            .client
            .ask_follow_up(&problem, &decision, &reasoning, &query)
            .await;

        let mut s = self.lock();
        s.finish(Activity::FollowUp, ticket);
        if s.epoch != epoch {
            tracing::debug!("discarding stale follow-up answer");
            return Ok(());
        }
        let WizardStep::ShowingDecision { outcome, .. } = &mut s.step else {
            return Ok(());
        };
        match result {
            Ok(answer) => {
                outcome.follow_up.last_answer = Some(answer);
                outcome.follow_up.count += 1;
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "follow-up failed");
                outcome.follow_up.last_error =
                    Some(StageError::new(ErrorStage::FollowUp, err.clone()).message());
                Err(err)
            }
        }
    }

    pub fn clear_follow_up_error(&self) {
        if let WizardStep::ShowingDecision { outcome, .. } = &mut self.lock().step {
            outcome.follow_up.last_error = None;
        }
    }

    /// Saves the decision on screen to the history.
    pub fn save_current_decision(&self) -> Result<(), GenieError> {
        let mut s = self.lock();
        let (session, outcome) = match &s.step {
            WizardStep::ShowingDecision { session, outcome } => (session.clone(), outcome.clone()),
            other => return Err(GenieError::invalid_state("save", other.kind())),
        };
        if outcome.saved {
            return Ok(());
        }
        if session.problem.trim().is_empty()
            || session.questions.is_empty()
            || session.answers.is_empty()
        {
            let err = GenieError::invalid_input(NOTHING_TO_SAVE);
            s.error = Some(StageError::new(ErrorStage::Save, err.clone()));
            return Err(err);
        }

        s.history_error = None;
        let saved = s.history.record_decision(
            &session.problem,
            &session.questions,
            &session.answers,
            &outcome.decision,
            Timestamp::now(),
        );
        match saved {
            Ok(_) => {
                if let WizardStep::ShowingDecision { outcome, .. } = &mut s.step {
                    outcome.saved = true;
                }
                Ok(())
            }
            Err(err) => {
                s.error = Some(StageError::new(ErrorStage::Save, err.clone()));
                Err(err)
            }
        }
    }

    /// Abandons everything and returns to the welcome step. History is kept.
    pub fn reset(&self) {
        let mut s = self.lock();
        s.clear_session();
        s.suggestions.clear();
        s.history_error = None;
        s.last_import = None;
        s.step = WizardStep::Welcome;
    }

    /// Returns from problem entry to the suggestion list, refetching it when
    /// nothing is cached.
    pub async fn back_to_suggestions(&self) -> Result<(), GenieError> {
        let cached = {
            let mut s = self.lock();
            if s.step.kind() != StepKind::AskingProblem {
                return Err(GenieError::invalid_state("back_to_suggestions", s.step.kind()));
            }
            s.clear_session();
            if s.suggestions.is_empty() {
                false
            } else {
                s.enter("back_to_suggestions", WizardStep::ShowingSuggestions)?;
                true
            }
        };
        if cached {
            Ok(())
        } else {
            self.fetch_suggestions().await
        }
    }

    /// Dismisses the main error and moves to the step it belongs to.
    ///
    /// Key errors leave the step alone so the user can fix the key first.
    pub fn clear_error(&self) {
        let mut s = self.lock();
        let Some(previous) = s.error.take() else {
            return;
        };
        if previous.error.is_key_error() {
            return;
        }
        let target = match previous.stage {
            ErrorStage::Suggestions => Some(WizardStep::AskingProblem),
            ErrorStage::Questions => {
                if !s.suggestions.is_empty() && s.problem_draft.is_empty() {
                    Some(WizardStep::ShowingSuggestions)
                } else {
                    Some(WizardStep::AskingProblem)
                }
            }
            ErrorStage::DynamicQuestion
            | ErrorStage::Decision
            | ErrorStage::Regeneration
            | ErrorStage::FollowUp
            | ErrorStage::Save => None,
        };
        if let Some(target) = target {
            if s.step.kind() != target.kind() {
                if let Err(e) = s.enter("clear_error", target) {
                    tracing::debug!(error = %e, "error dismissed without navigation");
                }
            }
        }
    }

    pub fn clear_history_error(&self) {
        self.lock().history_error = None;
    }

    /// Stores a user API key and dismisses a pending key error once the
    /// client is usable again.
    pub fn save_api_key(&self, key: &str) -> Result<bool, GenieError> {
        let initialized = self.client.save_user_key(key)?;
        if initialized {
            let mut s = self.lock();
            if s.error.as_ref().is_some_and(|e| e.error.is_key_error()) {
                s.error = None;
            }
        }
        Ok(initialized)
    }

    pub fn clear_api_key(&self) -> Result<bool, GenieError> {
        self.client.clear_user_key()
    }

    pub fn show_history(&self) -> Result<(), GenieError> {
        let mut s = self.lock();
        s.enter("show_history", WizardStep::ShowingHistory)?;
        s.error = None;
        s.history_error = None;
        Ok(())
    }

    /// Opens one saved record. An unknown id stays on the list with a
    /// history error.
    pub fn show_history_detail(&self, id: &str) -> Result<(), GenieError> {
        let mut s = self.lock();
        s.check("show_history_detail", StepKind::ShowingHistoryDetail)?;
        s.error = None;
        s.history_error = None;
        match s.history.find(id).cloned() {
            Some(record) => {
                s.enter(
                    "show_history_detail",
                    WizardStep::ShowingHistoryDetail(Box::new(record)),
                )?;
                Ok(())
            }
            None => {
                s.history_error = Some(UNKNOWN_HISTORY_ITEM.to_string());
                s.enter("show_history", WizardStep::ShowingHistory)?;
                Err(GenieError::invalid_input(UNKNOWN_HISTORY_ITEM))
            }
        }
    }

    pub fn back_to_welcome(&self) -> Result<(), GenieError> {
        let mut s = self.lock();
        s.enter("back_to_welcome", WizardStep::Welcome)?;
        Ok(())
    }

    /// Deletes a saved record; deleting the record on screen returns to
    /// the list.
    pub fn delete_history_item(&self, id: &str) -> Result<(), GenieError> {
        let mut s = self.lock();
        let viewing = match &s.step {
            WizardStep::ShowingHistory => false,
            WizardStep::ShowingHistoryDetail(record) => record.id.as_str() == id,
            other => return Err(GenieError::invalid_state("delete_history_item", other.kind())),
        };
        s.history_error = None;
        match s.history.delete(id) {
            Ok(_) => {
                if viewing {
                    s.enter("delete_history_item", WizardStep::ShowingHistory)?;
                }
                Ok(())
            }
            Err(err) => {
                s.history_error = Some(err.user_message());
                Err(err)
            }
        }
    }

    /// Writes the whole history as JSON into `dir`.
    pub fn export_history(&self, dir: impl AsRef<Path>) -> Result<PathBuf, GenieError> {
        let mut s = self.lock();
        s.history_error = None;
        let result = s
            .history
            .export_all(&Timestamp::now())
            .and_then(|export| export.write_to(dir));
        if let Err(err) = &result {
            s.history_error = Some(err.user_message());
        }
        result
    }

    pub fn import_history_file(&self, path: impl AsRef<Path>) -> Result<ImportReport, GenieError> {
        let mut s = self.lock();
        let result = s.history.import_file(path);
        Self::record_import(&mut s, result)
    }

    pub fn import_history_json(&self, contents: &str) -> Result<ImportReport, GenieError> {
        let mut s = self.lock();
        let result = s.history.import_json(contents);
        Self::record_import(&mut s, result)
    }

    fn record_import(
        s: &mut WizardState,
        result: Result<ImportReport, GenieError>,
    ) -> Result<ImportReport, GenieError> {
        match &result {
            Ok(report) => {
                s.last_import = Some(*report);
                s.history_error = if report.imported > 0 {
                    report.invalid_notice()
                } else {
                    Some(report.summary())
                };
            }
            Err(err) => {
                s.last_import = None;
                s.history_error = Some(err.user_message());
            }
        }
        result
    }
}
