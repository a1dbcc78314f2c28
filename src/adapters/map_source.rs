// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory configuration source.

use crate::domain::{ConfigKey, ConfigValue, Result};
use crate::ports::ConfigSource;
use std::collections::BTreeMap;

/// A fixed set of key-value pairs.
///
/// Used for computed layers (instance metadata, version override, merged module
/// defaults) and as an empty placeholder for absent local files.
///
/// ```rust
/// use layercfg::adapters::MapSource;
/// use layercfg::ports::ConfigSource;
///
/// let source = MapSource::new("defaults").with("app.name", "demo");
/// assert_eq!(source.get_str("app.name").unwrap().unwrap().as_str(), "demo");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MapSource {
    name: String,
    values: BTreeMap<String, String>,
}

impl MapSource {
    /// Creates an empty source.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: BTreeMap::new(),
        }
    }

    /// Creates a source holding `values`.
    pub fn from_map(name: impl Into<String>, values: BTreeMap<String, String>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Adds one entry.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Returns `true` if the source holds no entries.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ConfigSource for MapSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &ConfigKey) -> Result<Option<ConfigValue>> {
        Ok(self
            .values
            .get(key.as_str())
            .map(|v| ConfigValue::from(v.as_str())))
    }

    fn all_keys(&self) -> Result<Vec<ConfigKey>> {
        Ok(self.values.keys().map(|k| ConfigKey::from(k.as_str())).collect())
    }

    fn snapshot(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.values.clone())
    }
}
