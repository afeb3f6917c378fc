//! Value access and coercion helpers shared by the clause tools.

use serde_json::Value;

/// Reads a dot-separated path from a record.
///
/// Every hop must be an object; anything else yields `None` (absent).
pub fn get_value_by_path<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = record;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Returns true for a non-empty string made only of ASCII digits
pub fn is_digit_string(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Numeric coercion used by the comparison algebra.
///
/// Numbers pass through, booleans become 0/1, strings are trimmed and parsed
/// (an empty string is 0). Nothing else coerces.
pub fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => parse_numeric_str(s),
        _ => None,
    }
}

fn parse_numeric_str(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    // Rust accepts "inf"/"nan" spellings, textual numbers here do not
    let numeric_chars = trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'));
    if !numeric_chars {
        return None;
    }
    trimmed.parse::<f64>().ok()
}
