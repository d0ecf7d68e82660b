//! JSON utility functions

use serde_json::{Map, Value};

/// Human-readable kind of a JSON value, used in shape diagnostics
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Whether a value can be bound as a single SQL argument
pub fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

/// Object entries ordered by key (byte-wise)
///
/// `serde_json` is built with `preserve_order`, so map iteration follows the
/// input document. Anything that ends up in rendered SQL must go through
/// this instead.
pub fn sorted_entries(map: &Map<String, Value>) -> Vec<(&String, &Value)> {
    let mut entries: Vec<(&String, &Value)> = map.iter().collect();
    entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
    entries
}
