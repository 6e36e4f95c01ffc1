//! In-process store implementing both client traits.
//!
//! Used by tests, benches, and the CLI to exercise a [`Repository`] without a
//! server. Query rows are shaped like a real store's: a `time` column in
//! RFC 3339, then tags as strings, then fields, then `value`.
//!
//! [`Repository`]: crate::Repository

use parking_lot::RwLock;
use tracing::trace;

use crate::client::{Condition, PointQuery, PointWriter, Precision};
use crate::descriptor::{TIME_COLUMN, VALUE_COLUMN};
use crate::error::StoreError;
use crate::point::{Point, Row};
use crate::time::{format_rfc3339_nanos, now_nanos};
use crate::value::Value;

#[derive(Debug, Clone)]
struct StoredPoint {
    point: Point,
    nanos: i64,
}

/// Points kept in memory behind a read/write lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    points: RwLock<Vec<StoredPoint>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored points.
    pub fn len(&self) -> usize {
        self.points.read().len()
    }

    /// Whether the store holds no points.
    pub fn is_empty(&self) -> bool {
        self.points.read().is_empty()
    }

    /// Snapshot of the stored points, in write order.
    pub fn points(&self) -> Vec<Point> {
        self.points.read().iter().map(|p| p.point.clone()).collect()
    }
}

impl PointWriter for MemoryStore {
    fn write_points(&self, points: &[Point], precision: Precision) -> Result<(), StoreError> {
        if let Some(empty) = points.iter().find(|p| p.fields.is_empty() && p.value.is_none()) {
            return Err(StoreError::Rejected {
                reason: format!("point for '{}' has no fields", empty.measurement),
            });
        }

        let now = now_nanos();
        let mut stored = self.points.write();
        for point in points {
            let nanos = point.timestamp.map_or(now, |ts| precision.to_nanos(ts));
            stored.push(StoredPoint {
                point: point.clone(),
                nanos,
            });
        }
        trace!(written = points.len(), total = stored.len(), %precision, "stored points");
        Ok(())
    }
}

impl PointQuery for MemoryStore {
    fn select_all(&self, measurement: &str, conditions: &[Condition]) -> Result<Vec<Row>, StoreError> {
        let raw = conditions.iter().find(|c| matches!(c, Condition::Raw(_)));
        if let Some(Condition::Raw(fragment)) = raw {
            return Err(StoreError::Rejected {
                reason: format!("raw conditions are not supported: {fragment}"),
            });
        }

        let stored = self.points.read();
        let mut matching: Vec<&StoredPoint> = stored
            .iter()
            .filter(|p| p.point.measurement == measurement)
            .collect();
        matching.sort_by_key(|p| p.nanos);

        let rows = matching
            .into_iter()
            .map(to_row)
            .filter(|row| conditions.iter().all(|c| matches_condition(row, c)))
            .collect();
        Ok(rows)
    }
}

fn to_row(stored: &StoredPoint) -> Row {
    let mut row = Row::new().with(TIME_COLUMN, format_rfc3339_nanos(stored.nanos));
    for (key, value) in &stored.point.tags {
        // Tags without a rendering are never written to a store.
        let rendered = value.to_string();
        if rendered.is_empty() || matches!(value, Value::Metrics(_)) {
            continue;
        }
        row.push(key.as_str(), Value::String(rendered));
    }
    for (key, value) in &stored.point.fields {
        row.push(key.as_str(), value.clone());
    }
    if let Some(value) = &stored.point.value {
        row.push(VALUE_COLUMN, value.clone());
    }
    row
}

fn matches_condition(row: &Row, condition: &Condition) -> bool {
    match condition {
        Condition::Eq(column, expected) => row
            .get(column)
            .is_some_and(|actual| actual == expected || actual.to_string() == expected.to_string()),
        Condition::Raw(_) => false,
    }
}
