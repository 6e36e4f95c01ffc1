//! Schema extraction from static entity declarations.
//!
//! [`build_schema`] turns an [`EntityType`] declaration into an immutable
//! [`SchemaDescriptor`]. It runs once per entity type (normally through the
//! [`SchemaCache`](crate::cache::SchemaCache)) and enforces:
//!
//! - a non-empty measurement, declared on the type or any ancestor
//! - at most one property each for the value, timestamp, and
//!   array-of-metrics roles
//!
//! Field and tag keys are not unique: a later-declared property with the same
//! key replaces the earlier mapping.
//!
//! # Inherited properties
//!
//! By default the properties of every ancestor are enumerated too, root-most
//! ancestor first and the type's own properties last, so that a descendant's
//! declarations win key collisions. A property name redeclared by a
//! descendant replaces the ancestor's declaration of that name. Pass
//! `inherit_properties = false` to [`build_schema_for`] to restrict
//! enumeration to the type's own declarations.

use std::collections::BTreeMap;

use tracing::debug;

use crate::descriptor::{PropertyDescriptor, SchemaDescriptor};
use crate::entity::{Entity, EntityType, PropertyDecl, Role};
use crate::error::{MapError, Result, SchemaError};
use crate::value::ValueType;

/// Builds the schema for `E` with inherited properties included.
///
/// # Errors
///
/// Returns [`SchemaError`] if no measurement is declared, the declared name
/// is empty, or a single-valued role is claimed twice.
///
/// # Examples
///
/// ```rust
/// use pointmap::entity::{Entity, EntityType, PropertyDecl, Role};
/// use pointmap::value::{Value, ValueType};
///
/// const DISK: EntityType = EntityType::new("Disk").with_measurement("disk").with_properties(&[
///     PropertyDecl::new("device", &[Role::Tag("dev", ValueType::String)]),
///     PropertyDecl::new("free", &[Role::Field("free_bytes")]),
/// ]);
///
/// struct Disk;
///
/// impl Entity for Disk {
///     const TYPE: &'static EntityType = &DISK;
///
///     fn property(&self, _name: &str) -> Option<Value> {
///         None
///     }
/// }
///
/// let schema = pointmap::build_schema::<Disk>()?;
/// assert_eq!(schema.measurement(), "disk");
/// assert_eq!(schema.tags()["dev"].name(), "device");
/// assert_eq!(schema.fields()["free_bytes"].name(), "free");
/// # Ok::<(), pointmap::MapError>(())
/// ```
pub fn build_schema<E: Entity>() -> Result<SchemaDescriptor> {
    build_schema_for(E::TYPE, true)
}

/// Builds the schema for a declaration.
///
/// # Errors
///
/// See [`build_schema`].
pub fn build_schema_for(entity: &EntityType, inherit_properties: bool) -> Result<SchemaDescriptor> {
    let measurement = resolve_measurement(entity)?;

    let mut value: Option<PropertyDescriptor> = None;
    let mut timestamp: Option<PropertyDescriptor> = None;
    let mut array_of_metrics: Option<PropertyDescriptor> = None;
    let mut fields = BTreeMap::new();
    let mut tags = BTreeMap::new();

    for decl in enumerate_properties(entity, inherit_properties) {
        let name = decl.name();

        if decl.is_value() {
            claim_single(&mut value, Role::Value, entity, name, PropertyDescriptor::new(name))?;
        }

        if let Some((key, kind)) = decl.field() {
            let descriptor = match kind {
                Some(ValueType::Array) => return Err(invalid_declared_type(entity, key)),
                Some(kind) => PropertyDescriptor::typed(name, kind),
                None => PropertyDescriptor::new(name),
            };
            if let Some(previous) = fields.insert(key.to_string(), descriptor) {
                debug!(
                    entity = entity.name(),
                    key,
                    previous = previous.name(),
                    property = name,
                    "field key redeclared, later property wins"
                );
            }
        }

        if let Some((key, kind)) = decl.tag() {
            if kind == ValueType::Array {
                return Err(invalid_declared_type(entity, key));
            }
            if let Some(previous) = tags.insert(key.to_string(), PropertyDescriptor::typed(name, kind))
            {
                debug!(
                    entity = entity.name(),
                    key,
                    previous = previous.name(),
                    property = name,
                    "tag key redeclared, later property wins"
                );
            }
        }

        if decl.is_array_of_metrics() {
            claim_single(
                &mut array_of_metrics,
                Role::ArrayOfMetrics,
                entity,
                name,
                PropertyDescriptor::typed(name, ValueType::Array),
            )?;
        }

        if decl.is_timestamp() {
            claim_single(&mut timestamp, Role::Timestamp, entity, name, PropertyDescriptor::new(name))?;
        }
    }

    debug!(
        entity = entity.name(),
        measurement,
        fields = fields.len(),
        tags = tags.len(),
        has_value = value.is_some(),
        has_timestamp = timestamp.is_some(),
        has_metrics = array_of_metrics.is_some(),
        "built schema"
    );

    Ok(SchemaDescriptor::new(
        measurement.to_string(),
        value,
        fields,
        tags,
        array_of_metrics,
        timestamp,
    ))
}

/// Resolves the measurement, climbing the parent chain when the type itself
/// declares none.
fn resolve_measurement(entity: &EntityType) -> Result<&'static str> {
    match entity.resolve_measurement() {
        Some("") => Err(SchemaError::EmptyMeasurement {
            entity: entity.name().to_string(),
        }
        .into()),
        Some(name) => Ok(name),
        None => Err(SchemaError::MissingMeasurement {
            entity: entity.name().to_string(),
        }
        .into()),
    }
}

/// Lists the properties whose roles contribute to the schema.
fn enumerate_properties(entity: &EntityType, inherit: bool) -> Vec<&'static PropertyDecl> {
    if !inherit {
        return entity.own_properties().iter().collect();
    }

    let lineage: Vec<&EntityType> = entity.lineage().collect();
    let mut properties: Vec<&'static PropertyDecl> = Vec::new();
    for ancestor in lineage.into_iter().rev() {
        for decl in ancestor.own_properties() {
            match properties.iter().position(|p| p.name() == decl.name()) {
                Some(index) => properties[index] = decl,
                None => properties.push(decl),
            }
        }
    }
    properties
}

fn invalid_declared_type(entity: &EntityType, key: &str) -> MapError {
    SchemaError::InvalidDeclaredType {
        entity: entity.name().to_string(),
        key: key.to_string(),
    }
    .into()
}

fn claim_single(
    slot: &mut Option<PropertyDescriptor>,
    role: Role,
    entity: &EntityType,
    property: &str,
    descriptor: PropertyDescriptor,
) -> Result<()> {
    if slot.is_some() {
        return Err(SchemaError::DuplicateRole {
            entity: entity.name().to_string(),
            role: role.name(),
            property: property.to_string(),
        }
        .into());
    }
    *slot = Some(descriptor);
    Ok(())
}
