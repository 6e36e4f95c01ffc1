//! Query row → entity conversion (read path).
//!
//! Hydration maps each row column back to the entity property holding the
//! matching role, coerces it by the declared type, and calls the entity's
//! constructor with the collected values in parameter order.
//!
//! Columns with no role are collected into the array-of-metrics property,
//! keyed by column name, when the entity declares one; otherwise they are
//! ignored. The reserved `time` column is never collected that way.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::config::RowErrorPolicy;
use crate::descriptor::{SchemaDescriptor, TIME_COLUMN};
use crate::entity::{Arguments, Entity};
use crate::error::{HydrateError, MapError, Result};
use crate::point::Row;
use crate::time::parse_timestamp;
use crate::value::{Metrics, Value, ValueType};

/// Builds one entity from a query row.
///
/// The `time` column is reduced to whole epoch seconds, so sub-second
/// precision written by the serializer does not survive a round trip.
///
/// # Errors
///
/// - [`HydrateError::InvalidTimestamp`] if the `time` column cannot be parsed
/// - [`HydrateError::Coercion`] if a typed column does not convert
/// - [`HydrateError::ConstructorMissing`] if `E` declares no constructor
/// - [`HydrateError::MissingConstructorArgument`] if a required parameter has
///   no value
/// - [`HydrateError::ArgumentType`] if a value has the wrong shape for its
///   parameter
pub fn hydrate<E: Entity>(schema: &SchemaDescriptor, row: &Row) -> Result<E> {
    let lookup = schema.column_lookup();
    let mut collected: HashMap<&str, Value> = HashMap::with_capacity(lookup.len() + 1);
    let mut metrics = schema.array_of_metrics().map(|_| Metrics::new());

    for (column, raw) in row.iter() {
        match lookup.get(column) {
            Some(descriptor) if column == TIME_COLUMN => {
                collected.insert(descriptor.name(), parse_timestamp(raw)?);
            }
            Some(descriptor) => {
                collected.insert(descriptor.name(), coerce(column, raw, descriptor.kind())?);
            }
            None if column == TIME_COLUMN => {}
            None => {
                if let Some(metrics) = metrics.as_mut() {
                    metrics.push(column, raw.clone());
                }
            }
        }
    }

    if let (Some(descriptor), Some(metrics)) = (schema.array_of_metrics(), metrics) {
        collected.insert(descriptor.name(), Value::Metrics(metrics));
    }

    let constructor = E::constructor().ok_or_else(constructor_missing::<E>)?;

    let mut arguments = Vec::with_capacity(constructor.params().len());
    for param in constructor.params() {
        let value = match collected.remove(param.name()) {
            Some(value) => value,
            None if param.is_required() => {
                return Err(HydrateError::MissingConstructorArgument {
                    entity: E::TYPE.name().to_string(),
                    parameter: param.name().to_string(),
                }
                .into());
            }
            None => Value::Null,
        };
        arguments.push((param.name(), value));
    }

    constructor.invoke(Arguments::new(E::TYPE.name(), arguments))
}

/// Hydrates every row in order.
///
/// Under [`RowErrorPolicy::Skip`] a failing row is logged and left out of
/// the result; under [`RowErrorPolicy::Propagate`] the first failure is
/// returned. A missing constructor is returned under either policy, since
/// no row of the type could ever succeed.
///
/// # Errors
///
/// See [`hydrate`].
pub fn hydrate_all<E: Entity>(
    schema: &SchemaDescriptor,
    rows: &[Row],
    policy: RowErrorPolicy,
) -> Result<Vec<E>> {
    let mut entities = Vec::with_capacity(rows.len());
    let mut skipped = 0_usize;

    for (index, row) in rows.iter().enumerate() {
        match hydrate(schema, row) {
            Ok(entity) => entities.push(entity),
            Err(err @ MapError::Hydrate(HydrateError::ConstructorMissing { .. })) => return Err(err),
            Err(err) if policy == RowErrorPolicy::Propagate => return Err(err),
            Err(err) => {
                warn!(entity = E::TYPE.name(), row = index, error = %err, "skipping row");
                skipped += 1;
            }
        }
    }

    debug!(
        entity = E::TYPE.name(),
        rows = rows.len(),
        hydrated = entities.len(),
        skipped,
        "hydrated rows"
    );

    Ok(entities)
}

fn coerce(column: &str, raw: &Value, kind: Option<ValueType>) -> Result<Value> {
    match kind {
        None | Some(ValueType::String) => Ok(raw.clone()),
        Some(target) => raw.clone().coerce(target).ok_or_else(|| {
            HydrateError::Coercion {
                column: column.to_string(),
                target: target.as_str(),
                value: format!("{raw:?}"),
            }
            .into()
        }),
    }
}

fn constructor_missing<E: Entity>() -> MapError {
    HydrateError::ConstructorMissing {
        entity: E::TYPE.name().to_string(),
    }
    .into()
}
