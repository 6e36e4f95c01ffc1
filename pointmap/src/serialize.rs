//! Entity → [`Point`] conversion (write path).
//!
//! The serializer reads every role-bearing property named by a
//! [`SchemaDescriptor`] and installs it in the matching slot of a point. It
//! performs no I/O and does not consult declared tag types; stringifying
//! tags is left to the wire encoder.

use tracing::{trace, warn};

use crate::descriptor::{PropertyDescriptor, SchemaDescriptor};
use crate::entity::Entity;
use crate::error::{AccessError, Result};
use crate::point::Point;
use crate::value::Value;

/// Converts `entity` into a point using `schema`.
///
/// A value or timestamp property yielding [`Value::Null`] leaves that slot
/// empty. Array-of-metrics entries are merged into the point's fields;
/// declared fields win a key collision and the shadowed metric is dropped.
///
/// # Errors
///
/// - [`AccessError::PropertyAccess`] if a role-bearing property is neither
///   exposed nor reachable through an accessor
/// - [`AccessError::MetricsType`] if the array-of-metrics property yields a
///   scalar
/// - [`AccessError::TimestampType`] if the timestamp property yields
///   something other than an integer epoch
///
/// # Examples
///
/// ```rust
/// use pointmap::entity::{Entity, EntityType, PropertyDecl, Role};
/// use pointmap::value::{Value, ValueType};
///
/// const TEMP: EntityType = EntityType::new("Temp").with_measurement("temp").with_properties(&[
///     PropertyDecl::new("room", &[Role::Tag("room", ValueType::String)]),
///     PropertyDecl::new("celsius", &[Role::Value]),
/// ]);
///
/// struct Temp {
///     room: &'static str,
///     celsius: f64,
/// }
///
/// impl Entity for Temp {
///     const TYPE: &'static EntityType = &TEMP;
///
///     fn property(&self, name: &str) -> Option<Value> {
///         match name {
///             "room" => Some(self.room.into()),
///             "celsius" => Some(self.celsius.into()),
///             _ => None,
///         }
///     }
/// }
///
/// let schema = pointmap::build_schema::<Temp>()?;
/// let point = pointmap::serialize(&schema, &Temp { room: "lab", celsius: 21.5 })?;
/// assert_eq!(point.to_line_protocol()?, "temp,room=lab value=21.5");
/// # Ok::<(), pointmap::MapError>(())
/// ```
pub fn serialize<E: Entity>(schema: &SchemaDescriptor, entity: &E) -> Result<Point> {
    let mut point = Point::new(schema.measurement());

    if let Some(descriptor) = schema.value() {
        point.value = Some(read_property(entity, descriptor)?).filter(|v| !v.is_null());
    }

    for (key, descriptor) in schema.tags() {
        point.tags.insert(key.clone(), read_property(entity, descriptor)?);
    }

    for (key, descriptor) in schema.fields() {
        point.fields.insert(key.clone(), read_property(entity, descriptor)?);
    }

    if let Some(descriptor) = schema.array_of_metrics() {
        merge_metrics(entity, descriptor, &mut point)?;
    }

    if let Some(descriptor) = schema.timestamp() {
        point.timestamp = read_timestamp(entity, descriptor)?;
    }

    trace!(
        entity = E::TYPE.name(),
        measurement = %point.measurement,
        tags = point.tags.len(),
        fields = point.fields.len(),
        "serialized point"
    );

    Ok(point)
}

/// Direct property first, accessor second.
fn read_property<E: Entity>(entity: &E, descriptor: &PropertyDescriptor) -> Result<Value> {
    let name = descriptor.name();
    entity
        .property(name)
        .or_else(|| entity.accessor(name))
        .ok_or_else(|| {
            AccessError::PropertyAccess {
                entity: E::TYPE.name().to_string(),
                property: name.to_string(),
            }
            .into()
        })
}

fn merge_metrics<E: Entity>(entity: &E, descriptor: &PropertyDescriptor, point: &mut Point) -> Result<()> {
    let metrics = match read_property(entity, descriptor)? {
        Value::Metrics(metrics) => metrics,
        Value::Null => return Ok(()),
        other => {
            return Err(AccessError::MetricsType {
                entity: E::TYPE.name().to_string(),
                property: descriptor.name().to_string(),
                found: other.kind(),
            }
            .into());
        }
    };

    for (key, value) in metrics {
        if point.fields.contains_key(&key) {
            warn!(
                entity = E::TYPE.name(),
                key = %key,
                "metric shadowed by declared field, dropping"
            );
            continue;
        }
        point.fields.insert(key, value);
    }
    Ok(())
}

#[allow(clippy::cast_possible_truncation)]
fn read_timestamp<E: Entity>(entity: &E, descriptor: &PropertyDescriptor) -> Result<Option<i64>> {
    match read_property(entity, descriptor)? {
        Value::Null => Ok(None),
        Value::Integer(i) => Ok(Some(i)),
        Value::Float(f) if f.is_finite() => Ok(Some(f.trunc() as i64)),
        other => Err(AccessError::TimestampType {
            entity: E::TYPE.name().to_string(),
            property: descriptor.name().to_string(),
            found: other.kind(),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntityType, PropertyDecl, Role};
    use crate::extract::build_schema;
    use crate::value::{Metrics, ValueType};
    use crate::MapError;

    const PROBE: EntityType = EntityType::new("Probe").with_measurement("probe").with_properties(&[
        PropertyDecl::new("host", &[Role::Tag("host", ValueType::String)]),
        PropertyDecl::new("reading", &[Role::Value]),
        PropertyDecl::new("errors", &[Role::Field("errors")]),
        PropertyDecl::new("hidden", &[Role::Field("hidden")]),
        PropertyDecl::new("extra", &[Role::ArrayOfMetrics]),
        PropertyDecl::new("at", &[Role::Timestamp]),
    ]);

    struct Probe {
        reading: Value,
        extra: Value,
        at: Value,
        expose_hidden: bool,
    }

    impl Default for Probe {
        fn default() -> Self {
            Self {
                reading: Value::Float(1.5),
                extra: Value::Null,
                at: Value::Integer(1_609_459_200),
                expose_hidden: true,
            }
        }
    }

    impl Entity for Probe {
        const TYPE: &'static EntityType = &PROBE;

        fn property(&self, name: &str) -> Option<Value> {
            match name {
                "host" => Some("a".into()),
                "reading" => Some(self.reading.clone()),
                "errors" => Some(2_i64.into()),
                "extra" => Some(self.extra.clone()),
                "at" => Some(self.at.clone()),
                _ => None,
            }
        }

        fn accessor(&self, name: &str) -> Option<Value> {
            match name {
                "hidden" if self.expose_hidden => Some(true.into()),
                _ => None,
            }
        }
    }

    fn run(probe: &Probe) -> Result<Point> {
        serialize(&build_schema::<Probe>().unwrap(), probe)
    }

    #[test]
    fn test_all_roles_land_in_point() {
        let point = run(&Probe::default()).unwrap();
        assert_eq!(point.measurement, "probe");
        assert_eq!(point.value, Some(Value::Float(1.5)));
        assert_eq!(point.tags["host"], Value::from("a"));
        assert_eq!(point.fields["errors"], Value::Integer(2));
        assert_eq!(point.timestamp, Some(1_609_459_200));
    }

    #[test]
    fn test_accessor_fallback() {
        let point = run(&Probe::default()).unwrap();
        assert_eq!(point.fields["hidden"], Value::Boolean(true));

        let err = run(&Probe {
            expose_hidden: false,
            ..Probe::default()
        })
        .unwrap_err();
        assert!(matches!(
            err,
            MapError::Access(AccessError::PropertyAccess { ref property, .. }) if property == "hidden"
        ));
    }

    #[test]
    fn test_null_value_and_timestamp_are_absent() {
        let point = run(&Probe {
            reading: Value::Null,
            at: Value::Null,
            ..Probe::default()
        })
        .unwrap();
        assert_eq!(point.value, None);
        assert_eq!(point.timestamp, None);
    }

    #[test]
    fn test_metrics_merge_declared_fields_win() {
        let extra: Metrics = [("errors", Value::Integer(99)), ("latency", Value::Float(0.2))]
            .into_iter()
            .collect();
        let point = run(&Probe {
            extra: Value::Metrics(extra),
            ..Probe::default()
        })
        .unwrap();
        assert_eq!(point.fields["errors"], Value::Integer(2));
        assert_eq!(point.fields["latency"], Value::Float(0.2));
    }

    #[test]
    fn test_scalar_metrics_rejected() {
        let err = run(&Probe {
            extra: Value::Integer(1),
            ..Probe::default()
        })
        .unwrap_err();
        assert!(matches!(
            err,
            MapError::Access(AccessError::MetricsType { found: "int", .. })
        ));
    }

    #[test]
    fn test_timestamp_must_be_numeric() {
        let err = run(&Probe {
            at: Value::from("2021-01-01T00:00:00Z"),
            ..Probe::default()
        })
        .unwrap_err();
        assert!(matches!(
            err,
            MapError::Access(AccessError::TimestampType { found: "string", .. })
        ));

        let point = run(&Probe {
            at: Value::Float(10.9),
            ..Probe::default()
        })
        .unwrap();
        assert_eq!(point.timestamp, Some(10));
    }
}
