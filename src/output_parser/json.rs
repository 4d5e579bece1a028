//! Structured-list decoding.
//!
//! Turns a cleaned payload into raw candidate mappings. Nothing here checks
//! the question schema; that is the validator's job.

use serde_json::Value;

use crate::output_parser::error::{truncate, ParseError};

/// Decode a cleaned payload as a JSON list of candidate records.
///
/// A decode failure is a hard error for this attempt; it is never turned into
/// an empty list.
///
/// # Examples
///
/// ```
/// use trivia_forge::output_parser::parse_question_list;
///
/// let items = parse_question_list(r#"[{"question": "Q?"}, 42]"#).unwrap();
/// assert_eq!(items.len(), 2);
/// ```
pub fn parse_question_list(cleaned: &str) -> Result<Vec<Value>, ParseError> {
    let value: Value = serde_json::from_str(cleaned).map_err(|e| ParseError::Malformed {
        reason: e.to_string(),
        raw_json: truncate(cleaned, 200),
    })?;

    match value {
        Value::Array(items) => Ok(items),
        other => Err(ParseError::NotAList {
            found: json_type_name(&other),
        }),
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
