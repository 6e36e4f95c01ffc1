//! # pointmap
//!
//! Typed entity mapping for time-series points.
//!
//! pointmap maps plain Rust types onto time-series points (measurement,
//! tags, fields, a scalar value, a timestamp) and back again. Each type
//! declares which of its properties play which role in a `const`
//! [`EntityType`]; the crate compiles that declaration into a
//! [`SchemaDescriptor`] once, then uses it to serialize entities for a write
//! client and to hydrate query rows into entities.
//!
//! **Status**: This crate is in early development. The API is not yet stable.
//!
//! ## Key Properties
//!
//! - Role assignment is static: no reflection, no runtime discovery
//! - Measurement names are inherited from ancestor declarations
//! - Schemas are built once per type and shared behind an `Arc`
//! - Tags are typed on the read path and coerced back from strings
//! - No I/O of its own; stores plug in through two small traits
//!
//! ## Quick Start
//!
//! ```rust
//! use pointmap::entity::{Arguments, Constructor, Entity, EntityType, Param, PropertyDecl, Role};
//! use pointmap::value::{Value, ValueType};
//! use pointmap::{Row, build_schema, hydrate, serialize};
//!
//! // Declare roles once, at compile time.
//! const CPU: EntityType = EntityType::new("Cpu").with_measurement("cpu").with_properties(&[
//!     PropertyDecl::new("host", &[Role::Tag("host", ValueType::String)]),
//!     PropertyDecl::new("usage", &[Role::TypedField("usage", ValueType::Float)]),
//!     PropertyDecl::new("at", &[Role::Timestamp]),
//! ]);
//!
//! const CPU_PARAMS: &[Param] = &[Param::required("host"), Param::required("usage"), Param::optional("at")];
//!
//! struct Cpu {
//!     host: String,
//!     usage: f64,
//!     at: Option<i64>,
//! }
//!
//! impl Entity for Cpu {
//!     const TYPE: &'static EntityType = &CPU;
//!
//!     fn property(&self, name: &str) -> Option<Value> {
//!         match name {
//!             "host" => Some(self.host.clone().into()),
//!             "usage" => Some(self.usage.into()),
//!             "at" => Some(self.at.into()),
//!             _ => None,
//!         }
//!     }
//!
//!     fn constructor() -> Option<Constructor<Self>> {
//!         Some(Constructor::new(CPU_PARAMS, |args: &mut Arguments| {
//!             Ok(Cpu { host: args.take()?, usage: args.take()?, at: args.take()? })
//!         }))
//!     }
//! }
//!
//! let schema = build_schema::<Cpu>()?;
//!
//! // Write path: entity -> point -> line protocol
//! let point = serialize(&schema, &Cpu { host: "web1".into(), usage: 85.5, at: Some(1_640_000_000) })?;
//! assert_eq!(point.to_line_protocol()?, "cpu,host=web1 usage=85.5 1640000000");
//!
//! // Read path: query row -> entity
//! let row = Row::new()
//!     .with("time", "2021-12-20T11:33:20Z")
//!     .with("host", "web1")
//!     .with("usage", "85.5");
//! let cpu: Cpu = hydrate(&schema, &row)?;
//! assert_eq!(cpu.usage, 85.5);
//! assert_eq!(cpu.at, Some(1_640_000_000));
//! # Ok::<(), pointmap::MapError>(())
//! ```
//!
//! ## Architecture
//!
//! - [`Entity`] - Capability trait: role declarations, property access, constructor
//! - [`SchemaDescriptor`] - Compiled role mapping for one entity type
//! - [`Point`] / [`Row`] - Flat records going to and coming from a store
//! - [`Repository`] - Typed write/find facade over a store client
//! - [`SchemaCache`] - Build-once registry of descriptors
//!
//! ## Modules
//!
//! For lower-level access, the individual modules are also public:
//!
//! - [`entity`] - Static role declarations and constructor arguments
//! - [`extract`] - Schema extraction and validation
//! - [`descriptor`] - Schema descriptor types
//! - [`serialize`](mod@serialize) - Entity to point conversion
//! - [`hydrate`](mod@hydrate) - Row to entity conversion
//! - [`value`] - Dynamic values and declared types
//! - [`point`] - Point and row records
//! - [`line_protocol`] - Wire rendering of points
//! - [`time`] - Time column parsing
//! - [`client`] - Store client traits and query conditions
//! - [`memory`] - In-memory store
//! - [`cache`] - Schema cache
//! - [`repository`] - Repository facade
//! - [`config`] - Mapper configuration
//! - [`error`] - Error types

pub mod cache;
pub mod client;
pub mod config;
pub mod descriptor;
pub mod entity;
pub mod error;
pub mod extract;
pub mod hydrate;
pub mod line_protocol;
pub mod memory;
pub mod point;
pub mod repository;
pub mod serialize;
pub mod time;
pub mod value;

// Re-export primary API types at crate root for convenience.
pub use cache::SchemaCache;
pub use client::{Condition, PointQuery, PointWriter, Precision};
pub use config::{MapperConfig, RowErrorPolicy};
pub use descriptor::{PropertyDescriptor, SchemaDescriptor};
pub use entity::{Entity, EntityType};
pub use error::{MapError, Result};
pub use extract::{build_schema, build_schema_for};
pub use hydrate::{hydrate, hydrate_all};
pub use memory::MemoryStore;
pub use point::{Point, Row};
pub use repository::Repository;
pub use serialize::serialize;
pub use value::{Metrics, Value, ValueType};
