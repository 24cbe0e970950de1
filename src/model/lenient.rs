//! Lenient field decoders.
//!
//! Work-order payloads are hand-entered upstream, so amounts arrive as
//! numbers, as strings with grouping commas, as `null`, or not at all.
//! These decoders never reject a value; anything unusable becomes the
//! neutral value for its type.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Decode a number, treating null, booleans, objects and unparsable
/// strings as `0.0`.
pub fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(coerce_number).unwrap_or(0.0))
}

/// Decode text, stringifying numbers and treating everything else as "".
pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    })
}

/// Parse a JSON value as an amount, `0.0` when it is not one.
pub fn coerce_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()).unwrap_or(0.0),
        Value::String(s) => parse_grouped(s).unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Parse a numeric string that may contain `,` grouping separators.
pub fn parse_grouped(s: &str) -> Option<f64> {
    let cleaned: String = s.chars().filter(|c| *c != ',').collect();
    cleaned
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}
