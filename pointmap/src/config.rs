//! Mapper configuration.
//!
//! Loaded from JSON. Every key is optional; missing keys take the defaults
//! shown below.
//!
//! ```json
//! {
//!   "precision": "s",
//!   "inherit_properties": true,
//!   "row_errors": "skip"
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::client::Precision;
use crate::error::{ConfigError, Result};

/// What [`hydrate_all`](crate::hydrate::hydrate_all) does with a row that
/// fails to hydrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowErrorPolicy {
    /// Log the failure and continue with the next row.
    #[default]
    Skip,
    /// Stop and return the first failure.
    Propagate,
}

/// Settings shared by a repository's write and read paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Unit of entity timestamps, passed through to the writer.
    pub precision: Precision,

    /// Whether properties declared on ancestor types contribute roles.
    pub inherit_properties: bool,

    /// Batch hydration failure policy.
    pub row_errors: RowErrorPolicy,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            precision: Precision::Seconds,
            inherit_properties: true,
            row_errors: RowErrorPolicy::Skip,
        }
    }
}

impl MapperConfig {
    /// Parses a configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed JSON or unknown enum values.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pointmap::{MapperConfig, Precision, RowErrorPolicy};
    ///
    /// let config = MapperConfig::from_json(r#"{"precision": "ms"}"#)?;
    /// assert_eq!(config.precision, Precision::Milliseconds);
    /// assert_eq!(config.row_errors, RowErrorPolicy::Skip);
    /// # Ok::<(), pointmap::MapError>(())
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|source| ConfigError::Parse { source }.into())
    }

    /// Reads and parses a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is not valid configuration.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// Sets the timestamp precision.
    #[must_use]
    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    /// Sets whether inherited properties contribute roles.
    #[must_use]
    pub fn with_inherit_properties(mut self, inherit: bool) -> Self {
        self.inherit_properties = inherit;
        self
    }

    /// Sets the batch hydration failure policy.
    #[must_use]
    pub fn with_row_errors(mut self, policy: RowErrorPolicy) -> Self {
        self.row_errors = policy;
        self
    }
}
