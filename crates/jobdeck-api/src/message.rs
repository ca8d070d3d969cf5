//! Error message extraction from response bodies.
//!
//! Strategies are tried in order; the first one that matches wins. Each is
//! total over any JSON value and states exactly which shapes it accepts.

use serde_json::{Map, Value};

/// One way of pulling a readable message out of an error body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStrategy {
    /// Top-level `detail` or `message`.
    ///
    /// A string is used as-is. An object `detail` (a nested validation
    /// error) is handed to [`ExtractionStrategy::FirstFieldError`]; a list
    /// `detail` yields its first string.
    DetailField,
    /// First field whose value is a string or a non-empty list starting with
    /// a string, rendered as `"<field>: <message>"`.
    FirstFieldError,
    /// A body that is itself a JSON string.
    PlainText,
}

/// Strategies in the order they are applied.
pub const DEFAULT_STRATEGIES: [ExtractionStrategy; 3] = [
    ExtractionStrategy::DetailField,
    ExtractionStrategy::FirstFieldError,
    ExtractionStrategy::PlainText,
];

impl ExtractionStrategy {
    /// Apply this strategy to a parsed body.
    #[must_use]
    pub fn extract(self, body: &Value) -> Option<String> {
        match self {
            Self::DetailField => body.as_object().and_then(detail_field),
            Self::FirstFieldError => body.as_object().and_then(first_field_error),
            Self::PlainText => body.as_str().and_then(non_blank),
        }
    }
}

fn detail_field(obj: &Map<String, Value>) -> Option<String> {
    let detail = match obj.get("detail") {
        Some(Value::String(s)) => non_blank(s),
        Some(Value::Object(nested)) => first_field_error(nested),
        Some(Value::Array(items)) => items.iter().find_map(Value::as_str).and_then(non_blank),
        _ => None,
    };
    detail.or_else(|| obj.get("message").and_then(Value::as_str).and_then(non_blank))
}

fn first_field_error(obj: &Map<String, Value>) -> Option<String> {
    obj.iter().find_map(|(field, value)| {
        let text = match value {
            Value::String(s) => non_blank(s),
            Value::Array(items) => items.first().and_then(Value::as_str).and_then(non_blank),
            _ => None,
        }?;
        Some(format!("{field}: {text}"))
    })
}

fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Extract a message from a raw response body.
///
/// JSON bodies go through [`DEFAULT_STRATEGIES`]. A body that is not JSON
/// is used verbatim unless it is blank or an HTML page.
#[must_use]
pub fn extract_message(body: &str) -> Option<String> {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => DEFAULT_STRATEGIES
            .iter()
            .find_map(|strategy| strategy.extract(&value)),
        Err(_) => {
            let trimmed = body.trim();
            if trimmed.starts_with('<') {
                None
            } else {
                non_blank(trimmed)
            }
        }
    }
}
