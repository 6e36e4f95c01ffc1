//! Conversion of store-side time representations to epoch seconds.
//!
//! Query results carry the `time` column as a string. The hydrator turns it
//! into an integer epoch at whole-second granularity: any fractional second
//! is truncated, so an entity read back from the store loses sub-second
//! precision relative to what was written. This is a known limitation of the
//! read path, not a rounding bug.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

use crate::error::{HydrateError, Result};
use crate::value::Value;

/// Formats accepted for zone-less timestamps, interpreted as UTC.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parses a time string into whole epoch seconds.
///
/// Accepts RFC 3339 (`2021-01-01T00:00:00.5Z`, `2021-01-01T02:00:00+02:00`),
/// zone-less date-times (`2021-01-01 00:00:00`), bare dates (UTC midnight),
/// and integer epoch strings.
///
/// # Examples
///
/// ```rust
/// use pointmap::time::parse_time_str;
///
/// assert_eq!(parse_time_str("2021-01-01T00:00:00Z"), Some(1_609_459_200));
/// assert_eq!(parse_time_str("2021-01-01T00:00:00.999Z"), Some(1_609_459_200));
/// assert_eq!(parse_time_str("2021-01-01"), Some(1_609_459_200));
/// assert_eq!(parse_time_str("yesterday"), None);
/// ```
pub fn parse_time_str(input: &str) -> Option<i64> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.timestamp());
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Some(naive.and_utc().timestamp());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp());
    }

    input.parse::<i64>().ok()
}

/// Converts a `time` column value into whole epoch seconds.
///
/// Integers pass through unchanged (they are assumed to already be epoch
/// seconds), floats are truncated, and strings go through
/// [`parse_time_str`]. Null stays null.
///
/// # Errors
///
/// Returns [`HydrateError::InvalidTimestamp`] for unparseable strings and
/// non-scalar values.
#[allow(clippy::cast_possible_truncation)]
pub fn parse_timestamp(value: &Value) -> Result<Value> {
    let seconds = match value {
        Value::Null => return Ok(Value::Null),
        Value::Integer(i) => Some(*i),
        Value::Float(f) if f.is_finite() => Some(f.trunc() as i64),
        Value::String(s) => parse_time_str(s),
        _ => None,
    };

    seconds.map(Value::Integer).ok_or_else(|| {
        HydrateError::InvalidTimestamp {
            value: format!("{value:?}"),
        }
        .into()
    })
}

/// Renders epoch nanoseconds as an RFC 3339 UTC string, the way query
/// results present the `time` column.
pub fn format_rfc3339_nanos(nanos: i64) -> String {
    DateTime::<Utc>::from_timestamp_nanos(nanos).to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Current wall-clock time in epoch nanoseconds.
pub fn now_nanos() -> i64 {
    Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX)
}
