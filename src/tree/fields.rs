//! Lenient readers for loosely typed JSON fields
//!
//! Snapshots come from hand-edited files and older tool versions, so numbers
//! may arrive as strings and flags as anything truthy.

use serde_json::Value;

/// A finite number, or a string that parses as one
pub fn number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// `number` truncated towards zero
pub fn integer(value: &Value) -> Option<i64> {
    number(value).map(|n| n.trunc() as i64)
}

/// Non-negative integer id
pub fn id(value: &Value) -> Option<u32> {
    integer(value).and_then(|n| u32::try_from(n).ok())
}

/// Truthiness of an arbitrary value
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Integer field clamped into `[min, max]`, or `default` when absent or malformed
pub fn clamped(obj: &Value, key: &str, min: i64, max: i64, default: i64) -> i64 {
    obj.get(key)
        .and_then(integer)
        .map(|n| n.clamp(min, max))
        .unwrap_or(default)
}

/// Boolean field, or `default` when absent
pub fn flag(obj: &Value, key: &str, default: bool) -> bool {
    obj.get(key).map(truthy).unwrap_or(default)
}

/// String field, or `default` when absent or not a string
pub fn text(obj: &Value, key: &str, default: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}
