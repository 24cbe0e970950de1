//! Display formatting for amounts.
//!
//! Amounts print with `,` thousands separators and at most three fraction
//! digits. Anything that is not a number prints as the empty string, so a
//! bad cell shows up blank instead of failing the document.

use serde_json::Value;

use crate::model::lenient::parse_grouped;

/// Format any JSON value for display.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Number(n) => n.as_f64().map(format_number).unwrap_or_default(),
        Value::String(s) => format_str(s),
        _ => String::new(),
    }
}

/// Format an optional amount; `None` prints as "".
pub fn format_opt(value: Option<f64>) -> String {
    value.map(format_number).unwrap_or_default()
}

/// Format a string that holds a number, possibly already grouped.
pub fn format_str(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }
    if s.trim().is_empty() {
        return "0".to_string();
    }
    parse_grouped(s).map(format_number).unwrap_or_default()
}

/// Format a number with grouping separators.
pub fn format_number(n: f64) -> String {
    if !n.is_finite() {
        return String::new();
    }

    let fixed = format!("{:.3}", n.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut out = String::with_capacity(fixed.len() + int_part.len() / 3 + 1);
    // A negative that rounds to zero keeps its sign; `-0.0` itself does not
    if n < 0.0 {
        out.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}
