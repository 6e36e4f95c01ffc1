//! Compiled mapping between an entity type's properties and point roles.
//!
//! A [`SchemaDescriptor`] is built once per entity type by the
//! [`extract`](crate::extract) module and is then shared read-only by the
//! serializer and the hydrator. Nothing here mutates after construction.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::value::ValueType;

/// Reserved row column carrying the scalar value role.
pub const VALUE_COLUMN: &str = "value";

/// Reserved row column carrying the point time.
pub const TIME_COLUMN: &str = "time";

/// One role-bearing property of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    name: String,
    kind: Option<ValueType>,
}

impl PropertyDescriptor {
    /// Creates a descriptor with no coercion hint (value, timestamp, untyped fields).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: None,
        }
    }

    /// Creates a descriptor carrying a declared type (tags, typed fields, array role).
    pub fn typed(name: impl Into<String>, kind: ValueType) -> Self {
        Self {
            name: name.into(),
            kind: Some(kind),
        }
    }

    /// Entity-side property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared coercion type, if any.
    pub fn kind(&self) -> Option<ValueType> {
        self.kind
    }
}

/// Per-entity-type mapping of point roles to properties.
///
/// Invariants, all established by [`SchemaDescriptor::new`]'s caller in
/// [`crate::extract`]:
///
/// - `measurement` is non-empty
/// - at most one property each for value, timestamp, and array-of-metrics
/// - the array-of-metrics descriptor is typed [`ValueType::Array`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    measurement: String,
    value: Option<PropertyDescriptor>,
    fields: BTreeMap<String, PropertyDescriptor>,
    tags: BTreeMap<String, PropertyDescriptor>,
    array_of_metrics: Option<PropertyDescriptor>,
    timestamp: Option<PropertyDescriptor>,
}

impl SchemaDescriptor {
    /// Assembles a descriptor from already-validated parts.
    pub(crate) fn new(
        measurement: String,
        value: Option<PropertyDescriptor>,
        fields: BTreeMap<String, PropertyDescriptor>,
        tags: BTreeMap<String, PropertyDescriptor>,
        array_of_metrics: Option<PropertyDescriptor>,
        timestamp: Option<PropertyDescriptor>,
    ) -> Self {
        Self {
            measurement,
            value,
            fields,
            tags,
            array_of_metrics,
            timestamp,
        }
    }

    /// The measurement (series name) points of this type belong to.
    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    /// Property holding the scalar value role.
    pub fn value(&self) -> Option<&PropertyDescriptor> {
        self.value.as_ref()
    }

    /// Field key → property.
    pub fn fields(&self) -> &BTreeMap<String, PropertyDescriptor> {
        &self.fields
    }

    /// Tag key → property (typed).
    pub fn tags(&self) -> &BTreeMap<String, PropertyDescriptor> {
        &self.tags
    }

    /// Property holding the array-of-metrics role.
    pub fn array_of_metrics(&self) -> Option<&PropertyDescriptor> {
        self.array_of_metrics.as_ref()
    }

    /// Property holding the timestamp role.
    pub fn timestamp(&self) -> Option<&PropertyDescriptor> {
        self.timestamp.as_ref()
    }

    /// Combined row-column → property lookup used by the hydrator.
    ///
    /// Built in precedence order: the reserved `value` and `time` columns,
    /// then tags, then fields. A field sharing a key with a tag (or with a
    /// reserved column) replaces the earlier entry.
    pub fn column_lookup(&self) -> BTreeMap<&str, &PropertyDescriptor> {
        let mut lookup = BTreeMap::new();
        if let Some(value) = &self.value {
            lookup.insert(VALUE_COLUMN, value);
        }
        if let Some(timestamp) = &self.timestamp {
            lookup.insert(TIME_COLUMN, timestamp);
        }
        for (key, descriptor) in &self.tags {
            lookup.insert(key.as_str(), descriptor);
        }
        for (key, descriptor) in &self.fields {
            lookup.insert(key.as_str(), descriptor);
        }
        lookup
    }
}
