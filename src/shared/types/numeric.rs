//! Lenient numeric handling
//!
//! Prices, weights and charges arrive from spreadsheets, manual edits and
//! loosely typed JSON. Parsing never fails: anything that is not a finite
//! number reads as `None` (or `0.0` through [`coerce_number`]).

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer};

/// Parse a user supplied number, trimming whitespace.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a number, falling back to zero.
pub fn coerce_number(raw: &str) -> f64 {
    parse_number(raw).unwrap_or(0.0)
}

/// Coerce a JSON value (number, numeric string, null, ...) to `f64`.
pub fn coerce_value(value: &serde_json::Value) -> f64 {
    match value {
        serde_json::Value::Number(n) => n.as_f64().filter(|v| v.is_finite()).unwrap_or(0.0),
        serde_json::Value::String(s) => coerce_number(s),
        _ => 0.0,
    }
}

/// Round half away from zero to 2 decimal places.
///
/// Goes through `Decimal` so that values like `2.675` round the way they
/// read rather than the way their binary representation falls.
pub fn round2(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

/// Serde helper: deserialize any JSON value into an `f64`, defaulting to 0.
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(coerce_value).unwrap_or(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn parse_number_trims_and_rejects_garbage() {
        assert_eq!(parse_number(" 12.5 "), Some(12.5));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
    }

    #[test]
    fn coerce_number_defaults_to_zero() {
        assert_eq!(coerce_number("1,2"), 0.0);
        assert_eq!(coerce_number("-3"), -3.0);
    }

    #[test]
    fn round2_half_away_from_zero() {
        assert_eq!(round2(12.3456), 12.35);
        assert_eq!(round2(18.004), 18.0);
        assert_eq!(round2(2.675), 2.68);
        assert_eq!(round2(-1.555), -1.56);
        assert_eq!(round2(f64::NAN), 0.0);
    }

    #[derive(Deserialize)]
    struct Snapshot {
        #[serde(default, deserialize_with = "lenient_f64")]
        amount: f64,
    }

    #[test]
    fn lenient_f64_accepts_strings_and_nulls() {
        let s: Snapshot = serde_json::from_str(r#"{"amount":"250.5"}"#).unwrap();
        assert_eq!(s.amount, 250.5);
        let s: Snapshot = serde_json::from_str(r#"{"amount":null}"#).unwrap();
        assert_eq!(s.amount, 0.0);
        let s: Snapshot = serde_json::from_str(r#"{"amount":"n/a"}"#).unwrap();
        assert_eq!(s.amount, 0.0);
        let s: Snapshot = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(s.amount, 0.0);
    }
}
