//! Build-once cache of schema descriptors.
//!
//! Extraction walks the whole declaration chain, so its result is kept per
//! entity type and shared as an `Arc`. Readers take a shared lock; the first
//! caller for a type builds under the write lock after re-checking that no
//! other caller got there first. Failed builds are not cached.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use tracing::debug;

use crate::descriptor::SchemaDescriptor;
use crate::entity::Entity;
use crate::error::Result;
use crate::extract::build_schema_for;

type CacheKey = (TypeId, bool);

/// Per-type schema registry.
#[derive(Debug, Default)]
pub struct SchemaCache {
    schemas: RwLock<HashMap<CacheKey, Arc<SchemaDescriptor>>>,
}

impl SchemaCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache used by [`Repository::new`](crate::Repository::new).
    pub fn global() -> &'static SchemaCache {
        static GLOBAL: OnceLock<SchemaCache> = OnceLock::new();
        GLOBAL.get_or_init(SchemaCache::new)
    }

    /// Returns the schema for `E` with inherited properties included,
    /// building it on first use.
    ///
    /// # Errors
    ///
    /// Returns the [`SchemaError`](crate::error::SchemaError) from extraction
    /// if the declaration is invalid.
    pub fn get<E: Entity>(&self) -> Result<Arc<SchemaDescriptor>> {
        self.get_with::<E>(true)
    }

    /// Returns the schema for `E`, building it on first use.
    ///
    /// Schemas built with and without inherited properties are cached
    /// separately.
    ///
    /// # Errors
    ///
    /// See [`SchemaCache::get`].
    pub fn get_with<E: Entity>(&self, inherit_properties: bool) -> Result<Arc<SchemaDescriptor>> {
        let key = (TypeId::of::<E>(), inherit_properties);

        if let Some(schema) = self.schemas.read().get(&key) {
            return Ok(Arc::clone(schema));
        }

        let mut schemas = self.schemas.write();
        if let Some(schema) = schemas.get(&key) {
            return Ok(Arc::clone(schema));
        }

        let schema = Arc::new(build_schema_for(E::TYPE, inherit_properties)?);
        schemas.insert(key, Arc::clone(&schema));
        debug!(
            entity = E::TYPE.name(),
            inherit_properties,
            cached = schemas.len(),
            "cached schema"
        );
        Ok(schema)
    }

    /// Whether a schema for `E` has been built with the given inheritance
    /// setting.
    pub fn contains<E: Entity>(&self, inherit_properties: bool) -> bool {
        self.schemas
            .read()
            .contains_key(&(TypeId::of::<E>(), inherit_properties))
    }

    /// Number of cached schemas.
    pub fn len(&self) -> usize {
        self.schemas.read().len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.schemas.read().is_empty()
    }
}
