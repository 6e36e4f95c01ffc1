//! Flat records exchanged with the store client.
//!
//! A [`Point`] is what the serializer produces for a write; a [`Row`] is what
//! a query returns and what the hydrator consumes.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::value::Value;

/// A time-series point ready to be written.
///
/// Tag values are kept as the entity produced them; rendering them as
/// strings is the wire encoder's job (see [`crate::line_protocol`]).
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Point {
    /// Series the point belongs to.
    pub measurement: String,
    /// Primary scalar, written as the `value` field when present.
    pub value: Option<Value>,
    /// Indexed key/value pairs.
    pub tags: BTreeMap<String, Value>,
    /// Non-indexed key/value pairs.
    pub fields: BTreeMap<String, Value>,
    /// Epoch timestamp in the writer's precision unit. `None` lets the store
    /// assign its own time.
    pub timestamp: Option<i64>,
}

impl Point {
    /// Creates an empty point for `measurement`.
    pub fn new(measurement: impl Into<String>) -> Self {
        Self {
            measurement: measurement.into(),
            ..Self::default()
        }
    }

    /// Sets the scalar value.
    #[must_use]
    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Adds a tag.
    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Adds a field.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Sets the timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// One query result row: columns in the order the store returned them.
///
/// Column keys are unique; pushing an existing key replaces its value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    /// Creates an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a column, replacing any existing value under the same key.
    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.columns.iter_mut().find(|(k, _)| *k == column) {
            Some(slot) => slot.1 = value,
            None => self.columns.push((column, value)),
        }
    }

    /// Builder form of [`Row::push`].
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(column, value);
        self
    }

    /// Looks up a column by key.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.iter().find(|(k, _)| k == column).map(|(_, v)| v)
    }

    /// Iterates columns in their natural order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Builds a row from a JSON object, preserving key order.
    ///
    /// Returns `None` if `json` is not an object.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pointmap::point::Row;
    ///
    /// let row = Row::from_json(serde_json::json!({"time": "2021-01-01T00:00:00Z", "host": "a"}))
    ///     .unwrap();
    /// let keys: Vec<_> = row.iter().map(|(k, _)| k).collect();
    /// assert_eq!(keys, ["time", "host"]);
    /// ```
    pub fn from_json(json: serde_json::Value) -> Option<Self> {
        match json {
            serde_json::Value::Object(map) => Some(
                map.into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
            _ => None,
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Self::new();
        for (column, value) in iter {
            row.push(column, value);
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_builder() {
        let point = Point::new("cpu")
            .with_value(0.5)
            .with_tag("host", "a")
            .with_field("idle", 12_i64)
            .with_timestamp(10);
        assert_eq!(point.measurement, "cpu");
        assert_eq!(point.value, Some(Value::Float(0.5)));
        assert_eq!(point.tags["host"], Value::from("a"));
        assert_eq!(point.fields["idle"], Value::Integer(12));
        assert_eq!(point.timestamp, Some(10));
    }

    #[test]
    fn test_row_push_replaces() {
        let row = Row::new().with("a", 1_i64).with("b", 2_i64).with("a", 3_i64);
        assert_eq!(row.len(), 2);
        assert_eq!(row.get("a"), Some(&Value::Integer(3)));
        let keys: Vec<_> = row.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["a", "b"]);
    }

    #[test]
    fn test_row_from_json_rejects_non_objects() {
        assert!(Row::from_json(serde_json::json!([1, 2])).is_none());
        let row = Row::from_json(serde_json::json!({"cpu": "0.5", "n": 3})).unwrap();
        assert_eq!(row.get("n"), Some(&Value::Integer(3)));
    }

    #[test]
    fn test_point_serializes_to_json() {
        let point = Point::new("cpu").with_tag("host", "a").with_field("x", true);
        let json = serde_json::to_value(&point).unwrap();
        assert_eq!(json["measurement"], "cpu");
        assert_eq!(json["tags"]["host"], "a");
        assert_eq!(json["fields"]["x"], true);
        assert!(json["timestamp"].is_null());
    }
}
