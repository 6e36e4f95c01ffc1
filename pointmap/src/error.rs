//! Error types for the pointmap mapping engine.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for all pointmap operations.
///
/// Every failure is fail-fast: nothing in this crate retries. Sub-errors are
/// grouped by the stage that detects them (schema extraction, property
/// access, hydration, encoding, store client, configuration).
#[derive(Error, Debug)]
pub enum MapError {
    /// Error while extracting a schema from an entity declaration.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Error reading a role-bearing property from an entity (write path).
    #[error("access error: {0}")]
    Access(#[from] AccessError),

    /// Error turning a row back into an entity (read path).
    #[error("hydrate error: {0}")]
    Hydrate(#[from] HydrateError),

    /// Error rendering a point for the wire.
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    /// Error reported by the external store client.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Error loading mapper configuration.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors that can occur while building a [`SchemaDescriptor`](crate::SchemaDescriptor).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Neither the type nor any ancestor declares a measurement.
    #[error("{entity}: measurement role is not declared on the type or any ancestor")]
    MissingMeasurement {
        /// The entity type that was being resolved.
        entity: String,
    },

    /// A measurement role was found but its name is empty.
    #[error("{entity}: measurement name must be a non-empty string")]
    EmptyMeasurement {
        /// The entity type that was being resolved.
        entity: String,
    },

    /// More than one property claims a single-valued role.
    #[error("{entity}: more than one property holds the '{role}' role (second: '{property}')")]
    DuplicateRole {
        /// The entity type being resolved.
        entity: String,
        /// The single-valued role that was claimed twice.
        role: &'static str,
        /// The property that made the second claim.
        property: String,
    },

    /// A tag or typed field was declared with the array marker type.
    #[error("{entity}: '{key}' cannot be declared with the array type")]
    InvalidDeclaredType {
        /// The entity type being resolved.
        entity: String,
        /// The offending tag or field key.
        key: String,
    },
}

/// Errors that can occur reading values out of an entity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// The entity exposes neither the property nor an accessor for it.
    #[error("{entity}: cannot read property '{property}': not exposed and has no accessor")]
    PropertyAccess {
        /// The entity type.
        entity: String,
        /// The entity-side property name.
        property: String,
    },

    /// The array-of-metrics property did not yield a collection.
    #[error("{entity}: array-of-metrics property '{property}' must yield a collection, got {found}")]
    MetricsType {
        /// The entity type.
        entity: String,
        /// The entity-side property name.
        property: String,
        /// The kind of value that was found instead.
        found: &'static str,
    },

    /// The timestamp property did not yield an integer epoch.
    #[error("{entity}: timestamp property '{property}' must yield an integer epoch, got {found}")]
    TimestampType {
        /// The entity type.
        entity: String,
        /// The entity-side property name.
        property: String,
        /// The kind of value that was found instead.
        found: &'static str,
    },
}

/// Errors that can occur turning a row into an entity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HydrateError {
    /// The entity type exposes no parameterized constructor.
    #[error("{entity}: no constructor is declared, rows cannot be hydrated into this type")]
    ConstructorMissing {
        /// The entity type.
        entity: String,
    },

    /// A required constructor parameter has no value in the row.
    #[error("{entity}: constructor parameter '{parameter}' has no corresponding column")]
    MissingConstructorArgument {
        /// The entity type.
        entity: String,
        /// The parameter name.
        parameter: String,
    },

    /// A collected value cannot be converted to the parameter's type.
    #[error("constructor parameter '{parameter}' expects {expected}, got {found}")]
    ArgumentType {
        /// The parameter name.
        parameter: String,
        /// The expected Rust-side type.
        expected: &'static str,
        /// The kind of value that was found.
        found: &'static str,
    },

    /// A column value could not be coerced to its declared type.
    #[error("column '{column}': cannot coerce {value:?} to {target}")]
    Coercion {
        /// The row column key.
        column: String,
        /// The declared target type.
        target: &'static str,
        /// Debug rendering of the offending value.
        value: String,
    },

    /// The time column could not be parsed.
    #[error("invalid timestamp {value:?}")]
    InvalidTimestamp {
        /// Debug rendering of the offending value.
        value: String,
    },
}

/// Errors that can occur encoding a point for the wire.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// Line protocol requires at least one field.
    #[error("point for measurement '{measurement}' has no fields to write")]
    EmptyPoint {
        /// The measurement of the empty point.
        measurement: String,
    },
}

/// Errors surfaced by a store client.
///
/// These are opaque to the mapping layer and propagate unchanged.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store refused the write.
    #[error("store rejected the request: {reason}")]
    Rejected {
        /// Reason given by the store.
        reason: String,
    },

    /// Any other client failure (network, protocol, ...).
    #[error("store client failure: {0}")]
    Client(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors that can occur loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config '{}': {source}", path.display())]
    Read {
        /// The config file path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid JSON for [`MapperConfig`](crate::MapperConfig).
    #[error("failed to parse config: {source}")]
    Parse {
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// Type alias for `Result<T, MapError>`.
pub type Result<T> = std::result::Result<T, MapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_role_message_names_role_and_entity() {
        let err: MapError = SchemaError::DuplicateRole {
            entity: "CpuLoad".to_string(),
            role: "timestamp",
            property: "at".to_string(),
        }
        .into();
        let msg = err.to_string();
        assert!(msg.contains("CpuLoad"));
        assert!(msg.contains("'timestamp'"));
    }

    #[test]
    fn test_store_error_keeps_source() {
        use std::error::Error as _;

        let io = std::io::Error::other("connection reset");
        let err = StoreError::Client(Box::new(io));
        assert!(err.source().is_some());
    }
}
