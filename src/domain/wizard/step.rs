//! Wizard steps as a sum type over step-specific payloads.
//!
//! Each variant carries exactly the data its screen needs, so states like
//! "showing a decision without a decision" cannot be represented.
//! [`StepKind`] is the payload-free discriminant used for transition rules.

use super::SessionLimits;
use crate::domain::decision::{AnswerMap, DecisionData, Question, SavedDecision};
use crate::domain::foundation::{StateMachine, ValidationError};

/// Problem, questions and answers of the session in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionSession {
    pub problem: String,
    pub questions: Vec<Question>,
    pub answers: AnswerMap,
    /// Dynamic questions added so far.
    pub dynamic_added: u32,
    /// Set once the cap is hit or the model has nothing more to ask.
    pub no_more_questions: bool,
}

impl QuestionSession {
    pub fn new(problem: impl Into<String>, questions: Vec<Question>) -> Self {
        Self {
            problem: problem.into(),
            questions,
            answers: AnswerMap::new(),
            dynamic_added: 0,
            no_more_questions: false,
        }
    }

    /// Whether another dynamic question may be requested.
    pub fn can_add_question(&self, limits: &SessionLimits) -> bool {
        !self.no_more_questions && self.dynamic_added < limits.max_dynamic_questions
    }

    /// Ordinal used for the next dynamic question id (`dyn_q_{ordinal}`).
    pub fn next_dynamic_ordinal(&self) -> u32 {
        self.dynamic_added + 1
    }

    /// Appends a dynamic question and raises the exhaustion flag at the cap.
    pub fn push_dynamic_question(&mut self, question: Question, limits: &SessionLimits) {
        self.questions.push(question);
        self.dynamic_added += 1;
        if self.dynamic_added >= limits.max_dynamic_questions {
            self.no_more_questions = true;
        }
    }

    /// Records an answer for one of this session's questions.
    pub fn record_answer(&mut self, question_id: &str, answer: &str) -> Result<(), ValidationError> {
        if !self.questions.iter().any(|q| q.id == question_id) {
            return Err(ValidationError::invalid_format(
                "question_id",
                format!("unknown question {question_id}"),
            ));
        }
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(ValidationError::empty_field("answer"));
        }
        self.answers.record(question_id, answer);
        Ok(())
    }

    /// True when every question has a non-empty answer.
    pub fn is_fully_answered(&self) -> bool {
        self.answers.covers(&self.questions)
    }
}

/// Follow-up Q&A attached to the decision on screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FollowUp {
    pub last_answer: Option<String>,
    pub last_error: Option<String>,
    pub count: u32,
}

/// A decision plus everything that hangs off it while it is displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionOutcome {
    pub decision: DecisionData,
    pub regenerations: u32,
    pub follow_up: FollowUp,
    pub saved: bool,
}

impl DecisionOutcome {
    pub fn new(decision: DecisionData) -> Self {
        Self {
            decision,
            regenerations: 0,
            follow_up: FollowUp::default(),
            saved: false,
        }
    }

    /// Replaces the decision after a regeneration; follow-ups and the saved
    /// mark start over.
    pub fn regenerated(&self, decision: DecisionData) -> Self {
        Self {
            decision,
            regenerations: self.regenerations + 1,
            follow_up: FollowUp::default(),
            saved: false,
        }
    }

    pub fn can_regenerate(&self, limits: &SessionLimits) -> bool {
        self.regenerations < limits.max_regenerations
    }

    pub fn can_ask_follow_up(&self, limits: &SessionLimits) -> bool {
        self.follow_up.count < limits.max_follow_ups
    }
}

/// The screen the wizard is on, with its data.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WizardStep {
    #[default]
    Welcome,
    ShowingSuggestions,
    AskingProblem,
    GeneratingQuestions {
        problem: String,
    },
    AnsweringQuestions(QuestionSession),
    GeneratingDecision(QuestionSession),
    RegeneratingDecision {
        session: QuestionSession,
        previous: DecisionOutcome,
    },
    ShowingDecision {
        session: QuestionSession,
        outcome: DecisionOutcome,
    },
    ShowingHistory,
    ShowingHistoryDetail(Box<SavedDecision>),
}

impl WizardStep {
    pub fn kind(&self) -> StepKind {
        match self {
            WizardStep::Welcome => StepKind::Welcome,
            WizardStep::ShowingSuggestions => StepKind::ShowingSuggestions,
            WizardStep::AskingProblem => StepKind::AskingProblem,
            WizardStep::GeneratingQuestions { .. } => StepKind::GeneratingQuestions,
            WizardStep::AnsweringQuestions(_) => StepKind::AnsweringQuestions,
            WizardStep::GeneratingDecision(_) => StepKind::GeneratingDecision,
            WizardStep::RegeneratingDecision { .. } => StepKind::RegeneratingDecision,
            WizardStep::ShowingDecision { .. } => StepKind::ShowingDecision,
            WizardStep::ShowingHistory => StepKind::ShowingHistory,
            WizardStep::ShowingHistoryDetail(_) => StepKind::ShowingHistoryDetail,
        }
    }

    /// True while an AI request owns the screen.
    pub fn is_loading(&self) -> bool {
        matches!(
            self.kind(),
            StepKind::GeneratingQuestions
                | StepKind::GeneratingDecision
                | StepKind::RegeneratingDecision
        )
    }
}

/// Payload-free discriminant of [`WizardStep`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    Welcome,
    ShowingSuggestions,
    AskingProblem,
    GeneratingQuestions,
    AnsweringQuestions,
    GeneratingDecision,
    RegeneratingDecision,
    ShowingDecision,
    ShowingHistory,
    ShowingHistoryDetail,
}

impl StateMachine for StepKind {
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use StepKind::*;
        let mut targets = match self {
            Welcome => vec![ShowingSuggestions, AskingProblem, ShowingHistory],
            ShowingSuggestions => vec![AskingProblem, GeneratingQuestions],
            AskingProblem => vec![GeneratingQuestions, ShowingSuggestions],
            GeneratingQuestions => vec![AnsweringQuestions, AskingProblem],
            AnsweringQuestions => vec![GeneratingDecision],
            GeneratingDecision => vec![ShowingDecision, AnsweringQuestions],
            ShowingDecision => vec![RegeneratingDecision],
            RegeneratingDecision => vec![ShowingDecision, AnsweringQuestions],
            ShowingHistory => vec![ShowingHistoryDetail],
            ShowingHistoryDetail => vec![ShowingHistory],
        };
        // Reset is allowed from anywhere.
        if *self != Welcome {
            targets.push(Welcome);
        }
        targets
    }
}
