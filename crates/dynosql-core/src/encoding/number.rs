//! Numeric text encoding for `N` values.
//!
//! The wire format has no integer/float distinction, so decoding has to guess.

use serde_json::{Number, Value};

/// Render a native number as the decimal text carried by an `N` value.
pub fn encode_number(n: &Number) -> String {
    n.to_string()
}

/// Decode the text of an `N` value back into a native value.
///
/// Policy, in order:
/// 1. Non-empty and ASCII digits only: integer.
/// 2. Parses as a finite float: float.
/// 3. Anything else: the raw text.
///
/// A leading sign is not a digit, so `"-1"` decodes to the float `-1.0`.
/// Digit-only text too large for a `u64` falls through to the float parse.
pub fn decode_number(text: &str) -> Value {
    if is_digit_only(text)
        && let Ok(n) = text.parse::<u64>()
    {
        return Value::from(n);
    }

    match text.parse::<f64>() {
        Ok(f) => Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(text.to_string())),
        Err(_) => Value::String(text.to_string()),
    }
}

/// The exact integer an `N` text denotes, if it denotes one.
///
/// Integer text is parsed exactly, so values beyond 2^53 keep full
/// precision. Float text with no fractional part (`"1984.0"`, `"1e3"`)
/// counts as an integer too.
pub fn integral_value(text: &str) -> Option<i128> {
    if let Ok(n) = text.parse::<i128>() {
        return Some(n);
    }
    let f = text.parse::<f64>().ok()?;
    (f.is_finite() && f.fract() == 0.0 && f.abs() < 1e38).then_some(f as i128)
}

/// Render `N` text in a canonical form, so texts naming the same number
/// compare equal: `"1984"`, `"1984.0"` and `"1.984e3"` all become `"1984"`.
///
/// Text that is not a finite number is returned unchanged.
pub fn canonical_number(text: &str) -> String {
    if let Some(n) = integral_value(text) {
        return n.to_string();
    }
    match text.parse::<f64>() {
        Ok(f) if f.is_finite() => f.to_string(),
        _ => text.to_string(),
    }
}

fn is_digit_only(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}
