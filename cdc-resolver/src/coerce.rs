//! Defined coercions from loosely typed raw cells to engine values.
//!
//! The upstream loader infers column types best-effort, so amounts and
//! sequence numbers regularly arrive as strings. Each coercion here is
//! total over the inputs it accepts and returns `None` for everything else;
//! callers quarantine the row on `None`, never guess.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use common_types::FieldValue;
use serde_json::Value as JsonValue;

/// Timestamp formats observed in the raw feed, tried in order after RFC 3339.
const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Coerce a cell to an integer sequence number.
///
/// Accepts integers, integer-valued floats, and strings of either.
/// Returns `Ok(None)` for null/empty (a legal absent sequence),
/// `Err(())` when a present value is not coercible.
pub fn coerce_seq(cell: &JsonValue) -> Result<Option<i64>, ()> {
    match cell {
        JsonValue::Null => Ok(None),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Some(i))
            } else {
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(Some(f as i64)),
                    _ => Err(()),
                }
            }
        }
        JsonValue::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed.parse::<i64>().map(Some).map_err(|_| ())
        }
        _ => Err(()),
    }
}

/// Coerce a cell to a UTC timestamp.
///
/// Accepts RFC 3339, the feed's `YYYY-MM-DD HH:MM:SS` civil format, the
/// `T`-separated civil form, and bare dates (midnight UTC).
pub fn coerce_timestamp(cell: &JsonValue) -> Result<Option<DateTime<Utc>>, ()> {
    let raw = match cell {
        JsonValue::Null => return Ok(None),
        JsonValue::String(s) => s.trim(),
        _ => return Err(()),
    };
    if raw.is_empty() {
        return Ok(None);
    }
    parse_timestamp(raw).map(Some).ok_or(())
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in TIMESTAMP_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}

/// Coerce a declared numeric payload cell.
///
/// Integer-looking values stay `Int`, everything else numeric becomes
/// `Float`. Numeric strings (the classic string-typed amount) are parsed
/// after trimming.
pub fn coerce_numeric(cell: &JsonValue) -> Result<FieldValue, ()> {
    match cell {
        JsonValue::Null => Ok(FieldValue::Null),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(FieldValue::Int(i))
            } else {
                n.as_f64().map(FieldValue::Float).ok_or(())
            }
        }
        JsonValue::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(FieldValue::Null);
            }
            if let Ok(i) = trimmed.parse::<i64>() {
                return Ok(FieldValue::Int(i));
            }
            trimmed.parse::<f64>().map(FieldValue::Float).map_err(|_| ())
        }
        _ => Err(()),
    }
}

/// Coerce a tiebreaker cell: timestamps stay comparable as timestamps when
/// they parse, numbers as numbers, everything else as-is.
pub fn coerce_tiebreaker(cell: &JsonValue) -> FieldValue {
    if let JsonValue::String(s) = cell {
        if let Some(ts) = parse_timestamp(s.trim()) {
            return FieldValue::Timestamp(ts);
        }
    }
    FieldValue::from_json(cell)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_coerce_seq_variants() {
        assert_eq!(coerce_seq(&json!(3)), Ok(Some(3)));
        assert_eq!(coerce_seq(&json!(3.0)), Ok(Some(3)));
        assert_eq!(coerce_seq(&json!(" 7 ")), Ok(Some(7)));
        assert_eq!(coerce_seq(&json!(null)), Ok(None));
        assert_eq!(coerce_seq(&json!("")), Ok(None));
        assert_eq!(coerce_seq(&json!("3.5")), Err(()));
        assert_eq!(coerce_seq(&json!("abc")), Err(()));
        assert_eq!(coerce_seq(&json!(true)), Err(()));
    }

    #[test]
    fn test_coerce_timestamp_feed_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 13, 30, 0).unwrap();
        assert_eq!(
            coerce_timestamp(&json!("2024-03-01 13:30:00")),
            Ok(Some(expected))
        );
        assert_eq!(
            coerce_timestamp(&json!("2024-03-01T13:30:00Z")),
            Ok(Some(expected))
        );
        let midnight = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(coerce_timestamp(&json!("2024-03-01")), Ok(Some(midnight)));
        assert_eq!(coerce_timestamp(&json!(null)), Ok(None));
        assert_eq!(coerce_timestamp(&json!("not a date")), Err(()));
    }

    #[test]
    fn test_coerce_numeric_string_amounts() {
        assert_eq!(coerce_numeric(&json!("19.99")), Ok(FieldValue::Float(19.99)));
        assert_eq!(coerce_numeric(&json!(" 5 ")), Ok(FieldValue::Int(5)));
        assert_eq!(coerce_numeric(&json!(12.5)), Ok(FieldValue::Float(12.5)));
        assert_eq!(coerce_numeric(&json!(null)), Ok(FieldValue::Null));
        assert_eq!(coerce_numeric(&json!("N/A")), Err(()));
    }

    #[test]
    fn test_coerce_tiebreaker_prefers_timestamps() {
        let parsed = coerce_tiebreaker(&json!("2024-03-01 09:00:00"));
        assert!(matches!(parsed, FieldValue::Timestamp(_)));
        assert_eq!(
            coerce_tiebreaker(&json!("ORD-7")),
            FieldValue::Text("ORD-7".to_string())
        );
    }
}
