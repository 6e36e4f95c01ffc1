//! Static role declarations and the [`Entity`] capability trait.
//!
//! Every mapped type declares its roles in a `const` [`EntityType`]: the
//! measurement it belongs to, the declaration it extends (if any), and the
//! role set of each property. The declaration is the role-metadata provider
//! the schema extractor reads; nothing is discovered at runtime.
//!
//! # Example
//!
//! ```rust
//! use pointmap::entity::{Arguments, Constructor, Entity, EntityType, Param, PropertyDecl, Role};
//! use pointmap::value::{Value, ValueType};
//!
//! const BASE: EntityType = EntityType::new("Sample").with_measurement("samples");
//!
//! const CPU: EntityType = EntityType::new("Cpu").with_parent(&BASE).with_properties(&[
//!     PropertyDecl::new("host", &[Role::Tag("host", ValueType::String)]),
//!     PropertyDecl::new("load", &[Role::Value]),
//!     PropertyDecl::new("at", &[Role::Timestamp]),
//! ]);
//!
//! const CPU_PARAMS: &[Param] = &[
//!     Param::required("host"),
//!     Param::required("load"),
//!     Param::optional("at"),
//! ];
//!
//! struct Cpu {
//!     host: String,
//!     load: f64,
//!     at: Option<i64>,
//! }
//!
//! impl Entity for Cpu {
//!     const TYPE: &'static EntityType = &CPU;
//!
//!     fn property(&self, name: &str) -> Option<Value> {
//!         match name {
//!             "host" => Some(self.host.clone().into()),
//!             "load" => Some(self.load.into()),
//!             "at" => Some(self.at.into()),
//!             _ => None,
//!         }
//!     }
//!
//!     fn constructor() -> Option<Constructor<Self>> {
//!         Some(Constructor::new(CPU_PARAMS, |args: &mut Arguments| {
//!             Ok(Cpu { host: args.take()?, load: args.take()?, at: args.take()? })
//!         }))
//!     }
//! }
//!
//! assert_eq!(Cpu::TYPE.resolve_measurement(), Some("samples"));
//! ```

use std::fmt;

use crate::error::{HydrateError, Result};
use crate::value::{FromValue, Value, ValueType};

/// A role a property can hold. Roles are not mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// The point's scalar value (stored as the `value` field).
    Value,
    /// A field under the given key.
    Field(&'static str),
    /// A field under the given key whose query-side value is coerced to
    /// the declared type when hydrating.
    TypedField(&'static str, ValueType),
    /// A tag under the given key, with its entity-side type.
    Tag(&'static str, ValueType),
    /// Dynamic key/value collection folded into the point's fields.
    ArrayOfMetrics,
    /// The point's timestamp.
    Timestamp,
}

impl Role {
    /// Name of the role as used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Self::Value => "value",
            Self::Field(_) | Self::TypedField(..) => "field",
            Self::Tag(..) => "tag",
            Self::ArrayOfMetrics => "array-of-metrics",
            Self::Timestamp => "timestamp",
        }
    }
}

/// Role declarations for one property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyDecl {
    name: &'static str,
    roles: &'static [Role],
}

impl PropertyDecl {
    /// Declares `name` with the given roles.
    pub const fn new(name: &'static str, roles: &'static [Role]) -> Self {
        Self { name, roles }
    }

    /// Entity-side property name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// All declared roles.
    pub fn roles(&self) -> &'static [Role] {
        self.roles
    }

    /// Whether the property holds the value role.
    pub fn is_value(&self) -> bool {
        self.roles.contains(&Role::Value)
    }

    /// Whether the property holds the timestamp role.
    pub fn is_timestamp(&self) -> bool {
        self.roles.contains(&Role::Timestamp)
    }

    /// Whether the property holds the array-of-metrics role.
    pub fn is_array_of_metrics(&self) -> bool {
        self.roles.contains(&Role::ArrayOfMetrics)
    }

    /// Field key and optional declared type, if the property holds a field
    /// role.
    ///
    /// When declared more than once the last declaration wins.
    pub fn field(&self) -> Option<(&'static str, Option<ValueType>)> {
        self.roles.iter().rev().find_map(|role| match role {
            Role::Field(key) => Some((*key, None)),
            Role::TypedField(key, kind) => Some((*key, Some(*kind))),
            _ => None,
        })
    }

    /// Tag key and declared type, if the property holds a tag role.
    pub fn tag(&self) -> Option<(&'static str, ValueType)> {
        self.roles.iter().rev().find_map(|role| match role {
            Role::Tag(key, kind) => Some((*key, *kind)),
            _ => None,
        })
    }
}

/// Class-level declaration of an entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityType {
    name: &'static str,
    measurement: Option<&'static str>,
    parent: Option<&'static EntityType>,
    properties: &'static [PropertyDecl],
}

impl EntityType {
    /// Starts a declaration with no roles.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            measurement: None,
            parent: None,
            properties: &[],
        }
    }

    /// Declares the measurement role on this type.
    #[must_use]
    pub const fn with_measurement(mut self, measurement: &'static str) -> Self {
        self.measurement = Some(measurement);
        self
    }

    /// Declares the type this one extends.
    #[must_use]
    pub const fn with_parent(mut self, parent: &'static EntityType) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Declares this type's own properties, in declaration order.
    #[must_use]
    pub const fn with_properties(mut self, properties: &'static [PropertyDecl]) -> Self {
        self.properties = properties;
        self
    }

    /// Type name used in diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Measurement declared directly on this type (no ancestor lookup).
    pub fn class_measurement(&self) -> Option<&'static str> {
        self.measurement
    }

    /// Declared parent type.
    pub fn parent(&self) -> Option<&'static EntityType> {
        self.parent
    }

    /// Properties declared directly on this type.
    pub fn own_properties(&self) -> &'static [PropertyDecl] {
        self.properties
    }

    /// Iterates this type followed by its ancestors, nearest first.
    pub fn lineage(&self) -> impl Iterator<Item = &EntityType> {
        std::iter::successors(Some(self), |t| t.parent)
    }

    /// Measurement declared on this type or the nearest ancestor declaring one.
    ///
    /// An empty declaration still counts as found; validating the name is
    /// the extractor's job.
    pub fn resolve_measurement(&self) -> Option<&'static str> {
        self.lineage().find_map(EntityType::class_measurement)
    }
}

/// Capability trait implemented by every mapped entity.
///
/// Property access is explicit: [`Entity::property`] models public
/// properties and [`Entity::accessor`] models named accessor functions. The
/// serializer tries them in that order.
pub trait Entity: Sized + 'static {
    /// Role declarations for this type.
    const TYPE: &'static EntityType;

    /// Reads a directly exposed property by name.
    fn property(&self, name: &str) -> Option<Value>;

    /// Reads a property through its accessor, for properties that are not
    /// directly exposed.
    fn accessor(&self, name: &str) -> Option<Value> {
        let _ = name;
        None
    }

    /// The constructor used to hydrate rows into this type.
    ///
    /// Types that are write-only keep the default.
    fn constructor() -> Option<Constructor<Self>> {
        None
    }
}

/// A named constructor parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    name: &'static str,
    required: bool,
}

impl Param {
    /// A parameter that must be present in the row.
    pub const fn required(name: &'static str) -> Self {
        Self {
            name,
            required: true,
        }
    }

    /// A parameter that defaults to [`Value::Null`] when absent.
    pub const fn optional(name: &'static str) -> Self {
        Self {
            name,
            required: false,
        }
    }

    /// Parameter name, matched exactly against entity property names.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether hydration fails when the parameter is absent.
    pub fn is_required(&self) -> bool {
        self.required
    }
}

/// Parameter list plus build function of an entity constructor.
pub struct Constructor<E> {
    params: &'static [Param],
    build: fn(&mut Arguments) -> Result<E>,
}

impl<E> Constructor<E> {
    /// Declares a constructor taking `params` in order.
    pub const fn new(params: &'static [Param], build: fn(&mut Arguments) -> Result<E>) -> Self {
        Self { params, build }
    }

    /// Parameters in positional order.
    pub fn params(&self) -> &'static [Param] {
        self.params
    }

    pub(crate) fn invoke(&self, mut args: Arguments) -> Result<E> {
        (self.build)(&mut args)
    }
}

impl<E> fmt::Debug for Constructor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Positionally ordered constructor arguments.
#[derive(Debug)]
pub struct Arguments {
    entity: &'static str,
    values: std::vec::IntoIter<(&'static str, Value)>,
    position: usize,
}

impl Arguments {
    pub(crate) fn new(entity: &'static str, values: Vec<(&'static str, Value)>) -> Self {
        Self {
            entity,
            values: values.into_iter(),
            position: 0,
        }
    }

    /// Takes the next argument, converting it to the parameter's type.
    ///
    /// # Errors
    ///
    /// Returns [`HydrateError::ArgumentType`] when the value has the wrong
    /// shape, and [`HydrateError::MissingConstructorArgument`] when the
    /// build function asks for more arguments than were declared.
    pub fn take<T: FromValue>(&mut self) -> Result<T> {
        let Some((parameter, value)) = self.values.next() else {
            return Err(HydrateError::MissingConstructorArgument {
                entity: self.entity.to_string(),
                parameter: format!("#{}", self.position),
            }
            .into());
        };
        self.position += 1;
        let found = value.kind();
        T::from_value(value).ok_or_else(|| {
            HydrateError::ArgumentType {
                parameter: parameter.to_string(),
                expected: T::EXPECTED,
                found,
            }
            .into()
        })
    }

    /// Number of arguments not yet taken.
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}
