//! Interfaces to the external time-series store.
//!
//! The mapping engine never talks to a network itself. A repository is handed
//! something implementing [`PointWriter`] and/or [`PointQuery`] and delegates
//! I/O to it. Failures come back as opaque [`StoreError`]s and propagate
//! unchanged; no retry or timeout logic lives at this layer.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::point::{Point, Row};
use crate::value::Value;

/// Unit of point timestamps handed to the store.
///
/// The mapper passes this through untouched; only the store interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Precision {
    /// Nanoseconds (`ns`).
    #[serde(rename = "ns")]
    Nanoseconds,
    /// Microseconds (`u`).
    #[serde(rename = "u")]
    Microseconds,
    /// Milliseconds (`ms`).
    #[serde(rename = "ms")]
    Milliseconds,
    /// Seconds (`s`).
    #[default]
    #[serde(rename = "s")]
    Seconds,
    /// Minutes (`m`).
    #[serde(rename = "m")]
    Minutes,
    /// Hours (`h`).
    #[serde(rename = "h")]
    Hours,
}

impl Precision {
    /// Short unit name as used by the store's write endpoint.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nanoseconds => "ns",
            Self::Microseconds => "u",
            Self::Milliseconds => "ms",
            Self::Seconds => "s",
            Self::Minutes => "m",
            Self::Hours => "h",
        }
    }

    /// Nanoseconds per unit.
    pub fn nanos_per_unit(self) -> i64 {
        match self {
            Self::Nanoseconds => 1,
            Self::Microseconds => 1_000,
            Self::Milliseconds => 1_000_000,
            Self::Seconds => 1_000_000_000,
            Self::Minutes => 60_000_000_000,
            Self::Hours => 3_600_000_000_000,
        }
    }

    /// Converts a timestamp in this unit to nanoseconds, saturating on overflow.
    pub fn to_nanos(self, timestamp: i64) -> i64 {
        timestamp.saturating_mul(self.nanos_per_unit())
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A filter on a query.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `column = value`.
    Eq(String, Value),
    /// A raw `WHERE` fragment passed to the store verbatim.
    Raw(String),
}

impl Condition {
    /// Equality condition.
    pub fn equals(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq(column.into(), value.into())
    }

    /// Renders the condition as an InfluxQL expression.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pointmap::client::Condition;
    ///
    /// assert_eq!(Condition::equals("host", "it's").to_influxql(), r#""host" = 'it\'s'"#);
    /// assert_eq!(Condition::equals("cpu", 2_i64).to_influxql(), r#""cpu" = 2"#);
    /// ```
    pub fn to_influxql(&self) -> String {
        match self {
            Self::Eq(column, value) => {
                let rhs = match value {
                    Value::String(s) => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
                    other => other.to_string(),
                };
                format!("{} = {rhs}", quote_identifier(column))
            }
            Self::Raw(fragment) => fragment.clone(),
        }
    }
}

/// Builds the `SELECT * FROM <measurement> [WHERE ...]` statement a query
/// client runs for [`PointQuery::select_all`].
///
/// # Examples
///
/// ```rust
/// use pointmap::client::{select_statement, Condition};
///
/// let q = select_statement("cpu", &[Condition::equals("host", "a"), Condition::Raw("time > now() - 1h".into())]);
/// assert_eq!(q, r#"SELECT * FROM "cpu" WHERE "host" = 'a' AND time > now() - 1h"#);
/// ```
pub fn select_statement(measurement: &str, conditions: &[Condition]) -> String {
    let mut statement = format!("SELECT * FROM {}", quote_identifier(measurement));
    if !conditions.is_empty() {
        let clauses: Vec<String> = conditions.iter().map(Condition::to_influxql).collect();
        statement.push_str(" WHERE ");
        statement.push_str(&clauses.join(" AND "));
    }
    statement
}

fn quote_identifier(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Write side of a store client.
pub trait PointWriter {
    /// Persists `points`, whose timestamps are expressed in `precision`.
    ///
    /// # Errors
    ///
    /// Any client or store failure, unchanged.
    fn write_points(&self, points: &[Point], precision: Precision) -> Result<(), StoreError>;
}

/// Query side of a store client.
pub trait PointQuery {
    /// Returns every row of `measurement` matching all `conditions`.
    ///
    /// Each row must carry a `time` column.
    ///
    /// # Errors
    ///
    /// Any client or store failure, unchanged.
    fn select_all(&self, measurement: &str, conditions: &[Condition]) -> Result<Vec<Row>, StoreError>;
}

impl<T: PointWriter + ?Sized> PointWriter for Arc<T> {
    fn write_points(&self, points: &[Point], precision: Precision) -> Result<(), StoreError> {
        (**self).write_points(points, precision)
    }
}

impl<T: PointQuery + ?Sized> PointQuery for Arc<T> {
    fn select_all(&self, measurement: &str, conditions: &[Condition]) -> Result<Vec<Row>, StoreError> {
        (**self).select_all(measurement, conditions)
    }
}

impl<T: PointWriter + ?Sized> PointWriter for &T {
    fn write_points(&self, points: &[Point], precision: Precision) -> Result<(), StoreError> {
        (**self).write_points(points, precision)
    }
}

impl<T: PointQuery + ?Sized> PointQuery for &T {
    fn select_all(&self, measurement: &str, conditions: &[Condition]) -> Result<Vec<Row>, StoreError> {
        (**self).select_all(measurement, conditions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precision_conversion() {
        assert_eq!(Precision::Seconds.to_nanos(2), 2_000_000_000);
        assert_eq!(Precision::Milliseconds.to_nanos(2), 2_000_000);
        assert_eq!(Precision::Hours.to_nanos(i64::MAX), i64::MAX);
        assert_eq!(Precision::default(), Precision::Seconds);
    }

    #[test]
    fn test_precision_serde_names() {
        let p: Precision = serde_json::from_str(r#""ms""#).unwrap();
        assert_eq!(p, Precision::Milliseconds);
        assert_eq!(serde_json::to_string(&Precision::Microseconds).unwrap(), r#""u""#);
    }

    #[test]
    fn test_select_without_conditions() {
        assert_eq!(select_statement("we\"ird", &[]), r#"SELECT * FROM "we\"ird""#);
    }
}
