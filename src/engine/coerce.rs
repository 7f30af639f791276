//! Best-effort numeric coercion of override values.
//!
//! Configuration is usually textual, so `return: "0.5"` must come back as the
//! float `0.5` to compare equal to what the guarded code would have produced.

use super::value::Value;

/// Coerce a raw value: integer first, then float, else unchanged. Never fails.
pub fn coerce(raw: &Value) -> Value {
    match raw {
        Value::Str(text) => coerce_str(text).unwrap_or_else(|| raw.clone()),
        other => other.clone(),
    }
}

/// Numeric interpretation of a string, if it has one
pub fn coerce_str(text: &str) -> Option<Value> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Some(i) = parse_int(text) {
        return Some(Value::Int(i));
    }
    parse_float(text).map(Value::Float)
}

fn strip_separators(digits: &str) -> Option<String> {
    if digits.starts_with('_') || digits.ends_with('_') || digits.contains("__") {
        return None;
    }
    Some(digits.replace('_', ""))
}

fn parse_int(text: &str) -> Option<i64> {
    let (negative, body) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let lower = body.to_ascii_lowercase();
    let (radix, digits) = if let Some(rest) = lower.strip_prefix("0x") {
        (16, rest)
    } else if let Some(rest) = lower.strip_prefix("0o") {
        (8, rest)
    } else if let Some(rest) = lower.strip_prefix("0b") {
        (2, rest)
    } else {
        (10, lower.as_str())
    };

    let digits = strip_separators(digits)?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }

    // Parse with the sign attached so i64::MIN fits
    let signed = if negative {
        format!("-{}", digits)
    } else {
        digits
    };
    i64::from_str_radix(&signed, radix).ok()
}

fn parse_float(text: &str) -> Option<f64> {
    // Rust accepts "inf" and "NaN"; only plain decimal/scientific forms count here
    if !text
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E' | '_'))
    {
        return None;
    }
    if !text.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    let cleaned = strip_separators(text)?;
    cleaned.parse::<f64>().ok().filter(|x| x.is_finite())
}
