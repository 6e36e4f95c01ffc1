//! Dynamic values carried between entities, points, and query rows.
//!
//! Entities hand their role-bearing properties to the serializer as [`Value`]s,
//! and the hydrator hands row columns back to entity constructors the same
//! way. [`ValueType`] is the declared coercion hint attached to tag, typed
//! field, and array-of-metrics descriptors.

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// A single dynamically typed value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent / SQL-style null.
    #[default]
    Null,
    /// Boolean value.
    Boolean(bool),
    /// Signed 64-bit integer.
    Integer(i64),
    /// 64-bit float.
    Float(f64),
    /// UTF-8 string.
    String(String),
    /// Ordered key/value collection held by an array-of-metrics property.
    Metrics(Metrics),
}

impl Value {
    /// Short name of this value's kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "bool",
            Self::Integer(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Metrics(_) => "array",
        }
    }

    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the string slice if this is a [`Value::String`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer if this is a [`Value::Integer`].
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns a float for numeric values.
    #[allow(clippy::cast_precision_loss)] // i64 -> f64 widening is the documented conversion
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Coerces this value to a declared type.
    ///
    /// `String` is the identity (tags are stored as strings and no
    /// conversion is needed). Null stays null for every target. Returns
    /// `None` when the conversion is not meaningful, e.g. `"abc"` to int.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pointmap::value::{Value, ValueType};
    ///
    /// let v = Value::from("0.5").coerce(ValueType::Float);
    /// assert_eq!(v, Some(Value::Float(0.5)));
    /// assert_eq!(Value::from("yes").coerce(ValueType::Bool), Some(Value::Boolean(true)));
    /// assert_eq!(Value::from("abc").coerce(ValueType::Int), None);
    /// ```
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn coerce(self, target: ValueType) -> Option<Self> {
        if self.is_null() {
            return Some(self);
        }
        match target {
            ValueType::String => Some(self),
            ValueType::Int => match self {
                Self::Integer(_) => Some(self),
                Self::Float(f) if f.is_finite() => Some(Self::Integer(f.trunc() as i64)),
                Self::Boolean(b) => Some(Self::Integer(i64::from(b))),
                Self::String(s) => {
                    let s = s.trim();
                    s.parse::<i64>()
                        .ok()
                        .or_else(|| {
                            s.parse::<f64>()
                                .ok()
                                .filter(|f| f.is_finite())
                                .map(|f| f.trunc() as i64)
                        })
                        .map(Self::Integer)
                }
                _ => None,
            },
            ValueType::Float => match self {
                Self::Float(_) => Some(self),
                Self::Integer(i) => Some(Self::Float(i as f64)),
                Self::Boolean(b) => Some(Self::Float(if b { 1.0 } else { 0.0 })),
                Self::String(s) => s.trim().parse::<f64>().ok().map(Self::Float),
                _ => None,
            },
            ValueType::Bool => match self {
                Self::Boolean(_) => Some(self),
                Self::Integer(i) => Some(Self::Boolean(i != 0)),
                Self::Float(f) => Some(Self::Boolean(f != 0.0)),
                Self::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "t" | "1" | "yes" | "on" => Some(Self::Boolean(true)),
                    "false" | "f" | "0" | "no" | "off" | "" => Some(Self::Boolean(false)),
                    _ => None,
                },
                _ => None,
            },
            ValueType::Array => match self {
                Self::Metrics(_) => Some(self),
                _ => None,
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => f.write_str(s),
            Self::Metrics(m) => {
                f.write_str("{")?;
                for (i, (key, value)) in m.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}={value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Boolean(b) => serializer.serialize_bool(*b),
            Self::Integer(i) => serializer.serialize_i64(*i),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::String(s) => serializer.serialize_str(s),
            Self::Metrics(m) => {
                let mut map = serializer.serialize_map(Some(m.len()))?;
                for (key, value) in m.iter() {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

impl From<serde_json::Value> for Value {
    #[allow(clippy::cast_precision_loss)]
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::Metrics(Metrics::from_values(items.into_iter().map(Self::from)))
            }
            serde_json::Value::Object(map) => Self::Metrics(
                map.into_iter()
                    .map(|(key, value)| (key, Self::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<Metrics> for Value {
    fn from(m: Metrics) -> Self {
        Self::Metrics(m)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Declared coercion type of a tag or array-of-metrics property.
///
/// Tag values always travel as strings; the declared type restores the
/// entity-side type on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// Keep the stored string as-is.
    #[default]
    String,
    /// Convert to a signed integer.
    Int,
    /// Convert to a float.
    Float,
    /// Convert to a boolean.
    Bool,
    /// Marker type of the array-of-metrics role.
    Array,
}

impl ValueType {
    /// Lowercase name of the type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Array => "array",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered key/value collection held by the array-of-metrics role.
///
/// Keys are unique; pushing an existing key replaces its value in place.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Metrics {
    entries: Vec<(String, Value)>,
}

impl Metrics {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an index-keyed collection ("0", "1", ...) from unkeyed values.
    pub fn from_values<I: IntoIterator<Item = Value>>(values: I) -> Self {
        values
            .into_iter()
            .enumerate()
            .map(|(index, value)| (index.to_string(), value))
            .collect()
    }

    /// Inserts or replaces the value under `key`.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Looks up a value by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Metrics {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut metrics = Self::new();
        for (key, value) in iter {
            metrics.push(key, value);
        }
        metrics
    }
}

impl IntoIterator for Metrics {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Conversion from a hydrated [`Value`] into a constructor parameter type.
///
/// Conversions are strict: tag coercion has already happened by the time a
/// constructor sees its arguments, so a mismatch here is a schema bug.
pub trait FromValue: Sized {
    /// Human-readable name of the target type, used in errors.
    const EXPECTED: &'static str;

    /// Converts the value, or returns `None` if it has the wrong shape.
    fn from_value(value: Value) -> Option<Self>;
}

impl FromValue for Value {
    const EXPECTED: &'static str = "any value";

    fn from_value(value: Value) -> Option<Self> {
        Some(value)
    }
}

impl FromValue for String {
    const EXPECTED: &'static str = "string";

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl FromValue for i64 {
    const EXPECTED: &'static str = "int";

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Integer(i) => Some(i),
            _ => None,
        }
    }
}

impl FromValue for i32 {
    const EXPECTED: &'static str = "int (32-bit)";

    fn from_value(value: Value) -> Option<Self> {
        i64::from_value(value).and_then(|i| i32::try_from(i).ok())
    }
}

impl FromValue for u64 {
    const EXPECTED: &'static str = "unsigned int";

    fn from_value(value: Value) -> Option<Self> {
        i64::from_value(value).and_then(|i| u64::try_from(i).ok())
    }
}

impl FromValue for f64 {
    const EXPECTED: &'static str = "float";

    fn from_value(value: Value) -> Option<Self> {
        value.as_f64()
    }
}

impl FromValue for bool {
    const EXPECTED: &'static str = "bool";

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Boolean(b) => Some(b),
            _ => None,
        }
    }
}

impl FromValue for Metrics {
    const EXPECTED: &'static str = "array";

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Metrics(m) => Some(m),
            Value::Null => Some(Self::new()),
            _ => None,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    const EXPECTED: &'static str = T::EXPECTED;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            other => T::from_value(other).map(Some),
        }
    }
}
