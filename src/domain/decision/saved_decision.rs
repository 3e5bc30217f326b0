//! Persisted record of one complete problem → questions → answers → decision
//! session, plus the structural validator applied to imported records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{AnswerMap, DecisionData, Question};
use crate::domain::foundation::{SavedDecisionId, Timestamp, ValidationError};

/// One saved decision.
///
/// Immutable once created; the history store only appends or deletes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedDecision {
    pub id: SavedDecisionId,
    pub saved_at: Timestamp,
    pub problem_description: String,
    pub questions: Vec<Question>,
    pub answers: AnswerMap,
    pub decision_data: DecisionData,
}

impl SavedDecision {
    /// Validates a raw JSON value and converts it into a record.
    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        validate_saved_decision(&value)?;
        serde_json::from_value(value)
            .map_err(|e| ValidationError::invalid_format("record", e.to_string()))
    }
}

/// Checks that a JSON value has the shape of a [`SavedDecision`].
///
/// Unknown extra fields are tolerated. Returns the first violation found.
pub fn validate_saved_decision(value: &Value) -> Result<(), ValidationError> {
    let record = as_object(value, "record")?;

    require_str(record, "id")?;
    let saved_at = require_str(record, "savedAt")?;
    if Timestamp::parse(saved_at).is_none() {
        return Err(ValidationError::invalid_format("savedAt", "not a valid date"));
    }
    require_str(record, "problemDescription")?;

    let questions = require_array(record, "questions")?;
    for (index, question) in questions.iter().enumerate() {
        let field = format!("questions[{index}]");
        let question = as_object(question, &field)?;
        require_str(question, "id").map_err(|e| nest(&field, e))?;
        require_str(question, "text").map_err(|e| nest(&field, e))?;
        require_string_array(question, "options").map_err(|e| nest(&field, e))?;
    }

    let answers = as_object(field_of(record, "answers")?, "answers")?;
    if let Some((key, _)) = answers.iter().find(|(_, v)| !v.is_string()) {
        return Err(ValidationError::invalid_format(
            format!("answers.{key}"),
            "must be a string",
        ));
    }

    let decision = as_object(field_of(record, "decisionData")?, "decisionData")?;
    validate_decision_data(decision).map_err(|e| nest("decisionData", e))
}

fn validate_decision_data(decision: &Map<String, Value>) -> Result<(), ValidationError> {
    require_str(decision, "decision")?;
    require_str(decision, "reasoning")?;
    require_str(decision, "decisionStrength")?;

    match decision.get("additionalInfo") {
        None | Some(Value::Null) => {}
        Some(info) => {
            let info = as_object(info, "additionalInfo")?;
            if let Some(text) = info.get("text") {
                if !text.is_string() {
                    return Err(ValidationError::invalid_format(
                        "additionalInfo.text",
                        "must be a string",
                    ));
                }
            }
            if let Some(links) = info.get("sourceLinks") {
                let links = links.as_array().ok_or_else(|| {
                    ValidationError::invalid_format("additionalInfo.sourceLinks", "must be an array")
                })?;
                for (index, link) in links.iter().enumerate() {
                    let field = format!("additionalInfo.sourceLinks[{index}]");
                    let link = as_object(link, &field)?;
                    require_str(link, "uri").map_err(|e| nest(&field, e))?;
                    require_str(link, "title").map_err(|e| nest(&field, e))?;
                }
            }
        }
    }

    for optional in ["pros", "cons"] {
        match decision.get(optional) {
            None | Some(Value::Null) => {}
            Some(_) => {
                require_string_array(decision, optional)?;
            }
        }
    }
    Ok(())
}

fn as_object<'a>(value: &'a Value, field: &str) -> Result<&'a Map<String, Value>, ValidationError> {
    value
        .as_object()
        .ok_or_else(|| ValidationError::invalid_format(field, "must be an object"))
}

fn field_of<'a>(object: &'a Map<String, Value>, field: &str) -> Result<&'a Value, ValidationError> {
    object
        .get(field)
        .ok_or_else(|| ValidationError::empty_field(field))
}

fn require_str<'a>(object: &'a Map<String, Value>, field: &str) -> Result<&'a str, ValidationError> {
    field_of(object, field)?
        .as_str()
        .ok_or_else(|| ValidationError::invalid_format(field, "must be a string"))
}

fn require_array<'a>(
    object: &'a Map<String, Value>,
    field: &str,
) -> Result<&'a Vec<Value>, ValidationError> {
    field_of(object, field)?
        .as_array()
        .ok_or_else(|| ValidationError::invalid_format(field, "must be an array"))
}

fn require_string_array(object: &Map<String, Value>, field: &str) -> Result<(), ValidationError> {
    if require_array(object, field)?.iter().all(Value::is_string) {
        Ok(())
    } else {
        Err(ValidationError::invalid_format(field, "must contain only strings"))
    }
}

fn nest(parent: &str, err: ValidationError) -> ValidationError {
    match err {
        ValidationError::EmptyField { field } => ValidationError::empty_field(format!("{parent}.{field}")),
        ValidationError::TooFew { field, min, actual } => {
            ValidationError::too_few(format!("{parent}.{field}"), min, actual)
        }
        ValidationError::InvalidFormat { field, reason } => {
            ValidationError::invalid_format(format!("{parent}.{field}"), reason)
        }
    }
}
