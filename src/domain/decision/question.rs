//! Clarifying questions and the answers collected for them.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::domain::foundation::ValidationError;

/// Minimum number of options a question needs to be answerable.
pub const MIN_OPTIONS: usize = 2;

/// A multiple-choice clarifying question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub text: String,
    pub options: Vec<String>,
}

impl Question {
    /// Creates a question, rejecting blank text or fewer than two options.
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        options: Vec<String>,
    ) -> Result<Self, ValidationError> {
        let id = id.into();
        let text = text.into();
        if id.trim().is_empty() {
            return Err(ValidationError::empty_field("id"));
        }
        if text.trim().is_empty() {
            return Err(ValidationError::empty_field("text"));
        }
        if options.len() < MIN_OPTIONS {
            return Err(ValidationError::too_few("options", MIN_OPTIONS, options.len()));
        }
        Ok(Self { id, text, options })
    }
}

/// Returns true when no two questions share an id.
pub fn ids_are_unique(questions: &[Question]) -> bool {
    let mut seen = HashSet::new();
    questions.iter().all(|q| seen.insert(q.id.as_str()))
}

/// Selected option per question id.
///
/// Entries are only ever added or overwritten within a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerMap(BTreeMap<String, String>);

impl AnswerMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the answer for a question, replacing an earlier choice.
    pub fn record(&mut self, question_id: impl Into<String>, answer: impl Into<String>) {
        self.0.insert(question_id.into(), answer.into());
    }

    pub fn get(&self, question_id: &str) -> Option<&str> {
        self.0.get(question_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Questions that have no answer or only a blank one.
    pub fn unanswered<'a>(&self, questions: &'a [Question]) -> Vec<&'a Question> {
        questions
            .iter()
            .filter(|q| self.get(&q.id).map_or(true, |a| a.trim().is_empty()))
            .collect()
    }

    /// True when every question has a non-blank answer.
    pub fn covers(&self, questions: &[Question]) -> bool {
        self.unanswered(questions).is_empty()
    }
}

impl FromIterator<(String, String)> for AnswerMap {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
