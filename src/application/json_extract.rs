//! Tolerant decoding of JSON embedded in model output.
//!
//! Two phases: a strict parse of the (fence-stripped) text, then a lenient
//! scan that retries on the outermost `{...}` and then `[...]` substring.
//! Never fails; callers decide what an absent result means.

use serde_json::Value;

/// Outcome of [`extract_json`].
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractedJson {
    /// A JSON document was recovered.
    Value(Value),
    /// The model answered with a literal `{}`.
    EmptyObject,
    /// Nothing parseable was found.
    Unparseable,
}

impl ExtractedJson {
    /// The recovered value, treating `{}` as absent.
    pub fn into_value(self) -> Option<Value> {
        match self {
            ExtractedJson::Value(value) => Some(value),
            ExtractedJson::EmptyObject | ExtractedJson::Unparseable => None,
        }
    }
}

/// Extracts a JSON document from raw model text.
pub fn extract_json(raw: &str) -> ExtractedJson {
    let text = strip_code_fence(raw.trim());

    if let Some(found) = parse_candidate(text) {
        return found;
    }
    tracing::debug!(raw = %raw, "strict JSON parse failed, scanning for a JSON substring");

    if let Some(found) = delimited(text, '{', '}').and_then(parse_candidate) {
        return found;
    }
    if let Some(found) = delimited(text, '[', ']').and_then(parse_candidate) {
        return found;
    }

    tracing::debug!(raw = %raw, "no JSON document found in model output");
    ExtractedJson::Unparseable
}

fn parse_candidate(candidate: &str) -> Option<ExtractedJson> {
    let candidate = candidate.trim();
    let value: Value = serde_json::from_str(candidate).ok()?;
    if candidate == "{}" {
        return Some(ExtractedJson::EmptyObject);
    }
    Some(ExtractedJson::Value(value))
}

/// Returns the fenced body when the text contains a ``` block.
///
/// An optional `json` tag after the opening fence is skipped. A missing
/// closing fence (truncated output) keeps everything after the opening one.
fn strip_code_fence(text: &str) -> &str {
    let Some(open) = text.find("```") else {
        return text;
    };
    let after_open = &text[open + 3..];
    let body = after_open
        .strip_prefix("json")
        .or_else(|| after_open.strip_prefix("JSON"))
        .unwrap_or(after_open);
    let body = match body.find("```") {
        Some(close) => &body[..close],
        None => body,
    };
    body.trim()
}

/// Substring from the first `open` to the last `close`, inclusive.
fn delimited(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}
