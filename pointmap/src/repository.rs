//! Typed persistence facade over a store client.
//!
//! A [`Repository`] binds one entity type to a client and a cached schema.
//! Writes go entity → [`serialize`] → [`PointWriter::write_points`]; reads go
//! [`PointQuery::select_all`] → [`hydrate_all`] → entities.
//!
//! # Example
//!
//! ```rust
//! use pointmap::entity::{Arguments, Constructor, Entity, EntityType, Param, PropertyDecl, Role};
//! use pointmap::memory::MemoryStore;
//! use pointmap::value::{Value, ValueType};
//! use pointmap::{Condition, MapperConfig, Repository};
//!
//! const FAN: EntityType = EntityType::new("Fan").with_measurement("fans").with_properties(&[
//!     PropertyDecl::new("rack", &[Role::Tag("rack", ValueType::Int)]),
//!     PropertyDecl::new("rpm", &[Role::Value]),
//!     PropertyDecl::new("at", &[Role::Timestamp]),
//! ]);
//!
//! const FAN_PARAMS: &[Param] = &[Param::required("rack"), Param::required("rpm"), Param::required("at")];
//!
//! #[derive(Debug, PartialEq)]
//! struct Fan {
//!     rack: i64,
//!     rpm: i64,
//!     at: i64,
//! }
//!
//! impl Entity for Fan {
//!     const TYPE: &'static EntityType = &FAN;
//!
//!     fn property(&self, name: &str) -> Option<Value> {
//!         match name {
//!             "rack" => Some(self.rack.into()),
//!             "rpm" => Some(self.rpm.into()),
//!             "at" => Some(self.at.into()),
//!             _ => None,
//!         }
//!     }
//!
//!     fn constructor() -> Option<Constructor<Self>> {
//!         Some(Constructor::new(FAN_PARAMS, |args: &mut Arguments| {
//!             Ok(Fan { rack: args.take()?, rpm: args.take()?, at: args.take()? })
//!         }))
//!     }
//! }
//!
//! let repo = Repository::<Fan, _>::new(MemoryStore::new(), MapperConfig::default())?;
//! repo.write(&Fan { rack: 4, rpm: 1200, at: 1_609_459_200 })?;
//!
//! let fans = repo.find_all(&[Condition::equals("rack", 4_i64)])?;
//! assert_eq!(fans, [Fan { rack: 4, rpm: 1200, at: 1_609_459_200 }]);
//! # Ok::<(), pointmap::MapError>(())
//! ```

use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use crate::cache::SchemaCache;
use crate::client::{Condition, PointQuery, PointWriter};
use crate::config::MapperConfig;
use crate::descriptor::SchemaDescriptor;
use crate::entity::Entity;
use crate::error::Result;
use crate::hydrate::hydrate_all;
use crate::serialize::serialize;

/// Entity-typed access to a store.
pub struct Repository<E, C> {
    client: C,
    schema: Arc<SchemaDescriptor>,
    config: MapperConfig,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity, C> Repository<E, C> {
    /// Creates a repository, taking `E`'s schema from the process-wide cache.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`](crate::error::SchemaError) if `E`'s
    /// declaration is invalid.
    pub fn new(client: C, config: MapperConfig) -> Result<Self> {
        Self::with_cache(client, config, SchemaCache::global())
    }

    /// Creates a repository using a caller-owned schema cache.
    ///
    /// # Errors
    ///
    /// See [`Repository::new`].
    pub fn with_cache(client: C, config: MapperConfig, cache: &SchemaCache) -> Result<Self> {
        let schema = cache.get_with::<E>(config.inherit_properties)?;
        Ok(Self {
            client,
            schema,
            config,
            _entity: PhantomData,
        })
    }

    /// The schema the repository maps with.
    pub fn schema(&self) -> &SchemaDescriptor {
        &self.schema
    }

    /// The underlying client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// The repository's configuration.
    pub fn config(&self) -> &MapperConfig {
        &self.config
    }
}

impl<E: Entity, C: PointWriter> Repository<E, C> {
    /// Writes one entity.
    ///
    /// # Errors
    ///
    /// Serialization errors, or the client's [`StoreError`](crate::error::StoreError).
    pub fn write(&self, entity: &E) -> Result<()> {
        self.write_all(std::slice::from_ref(entity)).map(|_| ())
    }

    /// Writes a batch of entities in one client call and returns how many
    /// points were sent.
    ///
    /// Nothing is sent if any entity fails to serialize.
    ///
    /// # Errors
    ///
    /// Serialization errors, or the client's [`StoreError`](crate::error::StoreError).
    pub fn write_all(&self, entities: &[E]) -> Result<usize> {
        let points = entities
            .iter()
            .map(|entity| serialize(&self.schema, entity))
            .collect::<Result<Vec<_>>>()?;
        self.client.write_points(&points, self.config.precision)?;
        debug!(
            entity = E::TYPE.name(),
            measurement = self.schema.measurement(),
            points = points.len(),
            precision = %self.config.precision,
            "wrote points"
        );
        Ok(points.len())
    }
}

impl<E: Entity, C: PointQuery> Repository<E, C> {
    /// Selects every row of the entity's measurement matching all
    /// `conditions` and hydrates them.
    ///
    /// Rows that fail to hydrate are handled per the configured
    /// [`RowErrorPolicy`](crate::RowErrorPolicy).
    ///
    /// # Errors
    ///
    /// The client's [`StoreError`](crate::error::StoreError), or a hydration
    /// error under [`RowErrorPolicy::Propagate`](crate::RowErrorPolicy::Propagate).
    pub fn find_all(&self, conditions: &[Condition]) -> Result<Vec<E>> {
        let rows = self.client.select_all(self.schema.measurement(), conditions)?;
        hydrate_all(&self.schema, &rows, self.config.row_errors)
    }
}

impl<E, C: std::fmt::Debug> std::fmt::Debug for Repository<E, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("client", &self.client)
            .field("measurement", &self.schema.measurement())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Precision;
    use crate::config::RowErrorPolicy;
    use crate::entity::{Arguments, Constructor, EntityType, Param, PropertyDecl, Role};
    use crate::error::StoreError;
    use crate::memory::MemoryStore;
    use crate::point::Point;
    use crate::value::{Value, ValueType};
    use crate::MapError;

    const DISK: EntityType = EntityType::new("Disk").with_measurement("disk").with_properties(&[
        PropertyDecl::new("dev", &[Role::Tag("dev", ValueType::String)]),
        PropertyDecl::new("used", &[Role::Value]),
        PropertyDecl::new("at", &[Role::Timestamp]),
    ]);

    const DISK_PARAMS: &[Param] = &[Param::required("dev"), Param::required("used"), Param::required("at")];

    #[derive(Debug, PartialEq)]
    struct Disk {
        dev: String,
        used: i64,
        at: i64,
    }

    impl Entity for Disk {
        const TYPE: &'static EntityType = &DISK;

        fn property(&self, name: &str) -> Option<Value> {
            match name {
                "dev" => Some(self.dev.clone().into()),
                "used" => Some(self.used.into()),
                "at" => Some(self.at.into()),
                _ => None,
            }
        }

        fn constructor() -> Option<Constructor<Self>> {
            Some(Constructor::new(DISK_PARAMS, |args: &mut Arguments| {
                Ok(Disk {
                    dev: args.take()?,
                    used: args.take()?,
                    at: args.take()?,
                })
            }))
        }
    }

    fn disk(dev: &str, used: i64, at: i64) -> Disk {
        Disk {
            dev: dev.to_string(),
            used,
            at,
        }
    }

    const PART: EntityType = EntityType::new("Part").with_measurement("part").with_properties(&[
        PropertyDecl::new("dev", &[Role::Tag("dev", ValueType::String)]),
        PropertyDecl::new("index", &[Role::Tag("index", ValueType::Int)]),
        PropertyDecl::new("label", &[Role::Tag("label", ValueType::String)]),
        PropertyDecl::new("used", &[Role::Value]),
        PropertyDecl::new("at", &[Role::Timestamp]),
    ]);

    const PART_PARAMS: &[Param] = &[
        Param::required("dev"),
        Param::optional("index"),
        Param::optional("label"),
        Param::required("used"),
        Param::required("at"),
    ];

    #[derive(Debug, PartialEq)]
    struct Part {
        dev: String,
        index: Option<i64>,
        label: Option<String>,
        used: i64,
        at: i64,
    }

    impl Entity for Part {
        const TYPE: &'static EntityType = &PART;

        fn property(&self, name: &str) -> Option<Value> {
            match name {
                "dev" => Some(self.dev.clone().into()),
                "index" => Some(self.index.into()),
                "label" => Some(self.label.clone().into()),
                "used" => Some(self.used.into()),
                "at" => Some(self.at.into()),
                _ => None,
            }
        }

        fn constructor() -> Option<Constructor<Self>> {
            Some(Constructor::new(PART_PARAMS, |args: &mut Arguments| {
                Ok(Part {
                    dev: args.take()?,
                    index: args.take()?,
                    label: args.take()?,
                    used: args.take()?,
                    at: args.take()?,
                })
            }))
        }
    }

    struct Refusing;

    impl PointWriter for Refusing {
        fn write_points(&self, _points: &[Point], _precision: Precision) -> std::result::Result<(), StoreError> {
            Err(StoreError::Rejected {
                reason: "read-only".to_string(),
            })
        }
    }

    #[test]
    fn test_write_then_find() {
        let cache = SchemaCache::new();
        let repo = Repository::<Disk, _>::with_cache(MemoryStore::new(), MapperConfig::default(), &cache).unwrap();
        assert_eq!(repo.write_all(&[disk("sda", 10, 2), disk("sdb", 20, 1)]).unwrap(), 2);

        let disks = repo.find_all(&[]).unwrap();
        assert_eq!(disks, [disk("sdb", 20, 1), disk("sda", 10, 2)]);

        let sda = repo.find_all(&[Condition::equals("dev", "sda")]).unwrap();
        assert_eq!(sda, [disk("sda", 10, 2)]);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_absent_optional_tags_round_trip() {
        let config = MapperConfig::default().with_row_errors(RowErrorPolicy::Propagate);
        let repo = Repository::<Part, _>::with_cache(MemoryStore::new(), config, &SchemaCache::new()).unwrap();
        let bare = Part {
            dev: "sda".to_string(),
            index: None,
            label: None,
            used: 7,
            at: 10,
        };
        let full = Part {
            dev: "sdb".to_string(),
            index: Some(2),
            label: Some("root".to_string()),
            used: 9,
            at: 20,
        };
        repo.write_all(&[bare, full]).unwrap();

        let parts = repo.find_all(&[]).unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].index, None);
        assert_eq!(parts[0].label, None);
        assert_eq!(parts[1].index, Some(2));
        assert_eq!(parts[1].label.as_deref(), Some("root"));
    }

    #[test]
    fn test_precision_passed_to_client() {
        let config = MapperConfig::default().with_precision(Precision::Milliseconds);
        let repo = Repository::<Disk, _>::with_cache(MemoryStore::new(), config, &SchemaCache::new()).unwrap();
        repo.write(&disk("sda", 1, 1_500)).unwrap();

        // 1500 ms is stored as 1.5 s and read back at whole-second precision.
        let disks = repo.find_all(&[]).unwrap();
        assert_eq!(disks[0].at, 1);
    }

    #[test]
    fn test_store_errors_propagate() {
        let repo = Repository::<Disk, _>::with_cache(Refusing, MapperConfig::default(), &SchemaCache::new()).unwrap();
        let err = repo.write(&disk("sda", 1, 1)).unwrap_err();
        assert!(matches!(err, MapError::Store(StoreError::Rejected { .. })));
    }

    #[test]
    fn test_shared_client() {
        let store = Arc::new(MemoryStore::new());
        let repo = Repository::<Disk, _>::with_cache(Arc::clone(&store), MapperConfig::default(), &SchemaCache::new())
            .unwrap();
        repo.write(&disk("sda", 1, 1)).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(repo.schema().measurement(), "disk");
    }
}
