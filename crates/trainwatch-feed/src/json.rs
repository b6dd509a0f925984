//! Small helpers for the text-encoded numbers these feeds favor — a JSON
//! number is sometimes sent as a quoted string (`PPM.text`, `RollingPPM.text`),
//! so every numeric field is pulled out defensively rather than assumed to
//! already be `serde_json::Number`.

use serde_json::Value;

use crate::error::DecodeError;

/// Walk a dotted path of object keys, e.g. `&["RTPPMDataMsgV1", "timestamp"]`.
pub fn dig<'a>(value: &'a Value, path: &[&'static str]) -> Option<&'a Value> {
    let mut current = value;
    for key in path {
        current = current.as_object()?.get(*key)?;
    }
    Some(current)
}

/// A field that may arrive as a JSON number or a quoted numeric string.
pub fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// As [`as_i64`], but for floats.
pub fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

pub fn as_str(value: &Value) -> Option<&str> {
    value.as_str()
}

fn missing(path: &[&'static str]) -> DecodeError {
    DecodeError::MissingField(path.last().copied().unwrap_or(""))
}

pub fn field<'a>(value: &'a Value, path: &[&'static str]) -> Result<&'a Value, DecodeError> {
    dig(value, path).ok_or_else(|| missing(path))
}

pub fn field_i64(value: &Value, path: &[&'static str]) -> Result<i64, DecodeError> {
    as_i64(field(value, path)?).ok_or_else(|| missing(path))
}

pub fn field_f64(value: &Value, path: &[&'static str]) -> Result<f64, DecodeError> {
    as_f64(field(value, path)?).ok_or_else(|| missing(path))
}

pub fn field_str<'a>(value: &'a Value, path: &[&'static str]) -> Result<&'a str, DecodeError> {
    as_str(field(value, path)?).ok_or_else(|| missing(path))
}
