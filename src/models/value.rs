//! Field values and their stable text form
//!
//! Field values travel as `serde_json::Value`. Two values are considered the
//! same when their text forms match, so `100` and `"100"` compare equal and a
//! null compares equal to an empty string.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde_json::Value;

/// A named projection of field values
pub type FieldMap = BTreeMap<String, Value>;

/// Stable textual representation of a field value
pub fn text_form(value: &Value) -> Cow<'_, str> {
    match value {
        Value::Null => Cow::Borrowed(""),
        Value::String(s) => Cow::Borrowed(s.as_str()),
        Value::Bool(b) => Cow::Owned(b.to_string()),
        Value::Number(n) => Cow::Owned(n.to_string()),
        other => Cow::Owned(other.to_string()),
    }
}

/// Compare two optional values by text form; a missing value reads as null
pub fn same_text(before: Option<&Value>, after: Option<&Value>) -> bool {
    let before = before.map(text_form).unwrap_or(Cow::Borrowed(""));
    let after = after.map(text_form).unwrap_or(Cow::Borrowed(""));
    before == after
}

/// Parse a CLI-style literal: valid JSON is taken as-is, anything else is a string
pub fn parse_literal(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Format a value for human-readable display
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => {
            // Truncate long strings
            if s.chars().count() > 50 {
                let head: String = s.chars().take(47).collect();
                format!("\"{}...\"", head)
            } else {
                format!("\"{}\"", s)
            }
        }
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(obj) => format!("{{{} fields}}", obj.len()),
    }
}
