use std::num::IntErrorKind;

use serde_json::Value;

use crate::{TIMER_MAX_SECONDS, TIMER_MIN_SECONDS};

/// Lenient integer coercion for client-supplied JSON values.
///
/// Accepts integers, finite floats (truncated toward zero), booleans and
/// strings holding a base-10 integer with optional surrounding whitespace.
/// Out-of-range integers saturate at the `i64` bounds.
pub fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => {
            if let Some(n) = number.as_i64() {
                Some(n)
            } else if let Some(n) = number.as_u64() {
                Some(i64::try_from(n).unwrap_or(i64::MAX))
            } else {
                number
                    .as_f64()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            }
        }
        Value::String(text) => match text.trim().parse::<i64>() {
            Ok(n) => Some(n),
            Err(err) => match err.kind() {
                IntErrorKind::PosOverflow => Some(i64::MAX),
                IntErrorKind::NegOverflow => Some(i64::MIN),
                _ => None,
            },
        },
        Value::Bool(flag) => Some(i64::from(*flag)),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

pub fn clamp_timer(seconds: i64) -> u32 {
    seconds.clamp(i64::from(TIMER_MIN_SECONDS), i64::from(TIMER_MAX_SECONDS)) as u32
}

/// Trim the query and straighten typographic double quotes.
pub fn normalize_query(raw: &str) -> String {
    raw.trim().replace(['\u{201C}', '\u{201D}'], "\"")
}
