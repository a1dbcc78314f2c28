// SPDX-License-Identifier: MIT OR Apache-2.0

//! Loaders for the local layers: the local file pair and module defaults.

use crate::adapters::file::{env_override_path, parser_for};
use crate::adapters::{FileAdapter, MapSource};
use crate::domain::{ConfigError, Result};
use crate::ports::{ConfigSource, ModuleScanner, ResourceContent};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// The local file layer and its environment-specific override.
#[derive(Clone)]
pub struct LocalFileLayers {
    /// `P.ext`, or an empty layer when no local file was configured.
    pub base: Arc<dyn ConfigSource>,
    /// `P.{environment}.ext`, or an empty layer when that file does not exist.
    pub env_override: Arc<dyn ConfigSource>,
}

impl LocalFileLayers {
    /// Two empty layers.
    pub fn empty() -> Self {
        Self {
            base: Arc::new(MapSource::new("local-file")),
            env_override: Arc::new(MapSource::new("local-file-env")),
        }
    }

    /// Looks `key` up in the override first, then in the base file.
    pub fn lookup(&self, key: &str) -> Result<Option<String>> {
        for layer in [&self.env_override, &self.base] {
            if let Some(value) = layer.get_str(key)? {
                return Ok(Some(value.into()));
            }
        }
        Ok(None)
    }
}

impl std::fmt::Debug for LocalFileLayers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalFileLayers")
            .field("base", &self.base.name())
            .field("env_override", &self.env_override.name())
            .finish()
    }
}

/// Loads a local configuration file plus its environment override.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileLayerLoader;

impl FileLayerLoader {
    /// Loads `path` (if given) and its `{environment}` sibling (if present).
    ///
    /// A configured `path` that cannot be loaded is a
    /// [`ConfigError::ResourceLoadFailure`]; a missing override is not.
    ///
    /// ```rust
    /// use layercfg::service::FileLayerLoader;
    ///
    /// let layers = FileLayerLoader::load(None, "prod").unwrap();
    /// assert!(layers.lookup("anything").unwrap().is_none());
    /// ```
    pub fn load(path: Option<&Path>, environment: &str) -> Result<LocalFileLayers> {
        let Some(path) = path else {
            return Ok(LocalFileLayers::empty());
        };

        let base: Arc<dyn ConfigSource> = Arc::new(FileAdapter::from_file(path)?);
        let env_override: Arc<dyn ConfigSource> = match env_override_path(path, environment) {
            Some(sibling) if sibling.is_file() => {
                tracing::debug!("Using environment override {}", sibling.display());
                Arc::new(FileAdapter::from_file(&sibling)?)
            }
            _ => Arc::new(MapSource::new("local-file-env")),
        };

        Ok(LocalFileLayers { base, env_override })
    }
}

/// Merges the default properties declared by the application's modules.
#[derive(Debug, Default, Clone, Copy)]
pub struct ModuleDefaultsLoader;

impl ModuleDefaultsLoader {
    /// Reads every resource listed by `scanner` into one layer.
    ///
    /// Resources listed more than once are read once. A key declared by two
    /// different resources fails with [`ConfigError::DuplicateModuleKey`]
    /// naming both.
    pub fn load(scanner: &dyn ModuleScanner) -> Result<MapSource> {
        let mut merged: BTreeMap<String, String> = BTreeMap::new();
        let mut owners: BTreeMap<String, String> = BTreeMap::new();
        let mut seen = BTreeSet::new();

        for resource in scanner.default_resources()? {
            if !seen.insert(resource.name.clone()) {
                tracing::debug!("Skipping duplicate module resource {}", resource.name);
                continue;
            }

            let content = match &resource.content {
                ResourceContent::Embedded(text) => (*text).to_string(),
                ResourceContent::File(path) => {
                    fs::read_to_string(path).map_err(|e| ConfigError::ResourceLoadFailure {
                        resource: resource.name.clone(),
                        message: "failed to read module defaults".to_string(),
                        source: Some(Box::new(e)),
                    })?
                }
            };

            let parsed = parser_for(&resource.name)?
                .parse(&content)
                .map_err(|e| ConfigError::ResourceLoadFailure {
                    resource: resource.name.clone(),
                    message: e.to_string(),
                    source: Some(Box::new(e)),
                })?;

            tracing::debug!(
                "Loaded {} module defaults from {}",
                parsed.len(),
                resource.name
            );
            for (key, value) in parsed {
                if let Some(first) = owners.get(&key) {
                    return Err(ConfigError::DuplicateModuleKey {
                        key,
                        first: first.clone(),
                        second: resource.name.clone(),
                    });
                }
                owners.insert(key.clone(), resource.name.clone());
                merged.insert(key, value);
            }
        }

        Ok(MapSource::from_map("module-defaults", merged))
    }
}
