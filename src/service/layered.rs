// SPDX-License-Identifier: MIT OR Apache-2.0

//! The composed, layered configuration.
//!
//! A [`LayeredConfig`] is an ordered stack of named layers. Lookups return the
//! value from the first (highest-precedence) layer defining the key. The order
//! is fixed when the stack is composed.

use crate::domain::{ConfigError, ConfigKey, ConfigValue, ConfigurationService, LayerKind, Result};
use crate::ports::ConfigSource;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Shared handle to a composed configuration.
pub type ConfigHandle = Arc<LayeredConfig>;

/// One layer of a [`LayeredConfig`].
#[derive(Clone)]
pub struct Layer {
    kind: LayerKind,
    source: Arc<dyn ConfigSource>,
}

impl Layer {
    /// Creates a layer of `kind` served by `source`.
    pub fn new(kind: LayerKind, source: Arc<dyn ConfigSource>) -> Self {
        Self { kind, source }
    }

    /// The layer's precedence class.
    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    /// The source backing this layer.
    pub fn source(&self) -> &Arc<dyn ConfigSource> {
        &self.source
    }

    /// `kind:source-name`, e.g. `remote-base:remote:/prod/app/1.0/config`.
    pub fn display_name(&self) -> String {
        format!("{}:{}", self.kind.label(), self.source.name())
    }
}

impl std::fmt::Debug for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Layer")
            .field("kind", &self.kind)
            .field("source", &self.source.name())
            .finish()
    }
}

/// An ordered stack of configuration layers.
///
/// # Examples
///
/// ```rust
/// use layercfg::adapters::MapSource;
/// use layercfg::domain::{ConfigurationService, LayerKind};
/// use layercfg::service::LayeredConfig;
/// use std::sync::Arc;
///
/// let config = LayeredConfig::builder()
///     .with_layer(LayerKind::LocalFile, Arc::new(MapSource::new("file").with("k", "3")))
///     .with_layer(LayerKind::RemoteInstance, Arc::new(MapSource::new("remote").with("k", "1")))
///     .build();
///
/// assert_eq!(config.get_string("k").unwrap(), "1");
/// ```
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    layers: Vec<Layer>,
}

impl LayeredConfig {
    /// Composes `layers`, ordering them by descending rank of their kind.
    /// Layers of equal kind keep their given order.
    pub fn new(mut layers: Vec<Layer>) -> Self {
        layers.sort_by_key(|layer| std::cmp::Reverse(layer.kind.rank()));
        Self { layers }
    }

    /// Creates a builder.
    pub fn builder() -> LayeredConfigBuilder {
        LayeredConfigBuilder::new()
    }

    /// The layers, highest precedence first.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Display names of the layers, highest precedence first.
    pub fn layer_names(&self) -> Vec<String> {
        self.layers.iter().map(Layer::display_name).collect()
    }

    /// Every resolved key-value pair.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        let mut result = BTreeMap::new();
        for layer in self.layers.iter().rev() {
            match layer.source.snapshot() {
                Ok(values) => result.extend(values),
                Err(e) => tracing::debug!(
                    "Skipping layer '{}' in snapshot: {}",
                    layer.display_name(),
                    e
                ),
            }
        }
        result
    }

    /// Closes every layer, releasing remote watches. Returns the first error.
    pub fn close(&self) -> Result<()> {
        let mut first_error = None;
        for layer in &self.layers {
            if let Err(e) = layer.source.close() {
                tracing::warn!("Failed to close layer '{}': {}", layer.display_name(), e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn query_layers(&self, key: &ConfigKey) -> Option<ConfigValue> {
        for layer in &self.layers {
            match layer.source.get(key) {
                Ok(Some(value)) => return Some(value),
                Ok(None) => continue,
                Err(e) => {
                    // Log the error but continue to next layer
                    tracing::debug!(
                        "Error querying layer '{}' for key '{}': {}",
                        layer.display_name(),
                        key,
                        e
                    );
                    continue;
                }
            }
        }
        None
    }
}

impl ConfigurationService for LayeredConfig {
    fn get(&self, key: &ConfigKey) -> Result<ConfigValue> {
        self.query_layers(key)
            .ok_or_else(|| ConfigError::ConfigKeyNotFound {
                key: key.as_str().to_string(),
            })
    }

    fn keys(&self) -> Vec<ConfigKey> {
        let mut seen = BTreeSet::new();
        let mut result = Vec::new();
        for layer in &self.layers {
            let Ok(keys) = layer.source.all_keys() else {
                continue;
            };
            for key in keys {
                if seen.insert(key.clone()) {
                    result.push(key);
                }
            }
        }
        result
    }

    fn reload(&self) -> Result<()> {
        for layer in &self.layers {
            if let Err(e) = layer.source.reload() {
                tracing::warn!("Failed to reload layer '{}': {}", layer.display_name(), e);
            }
        }
        Ok(())
    }
}

/// Builder for [`LayeredConfig`].
#[derive(Debug, Default)]
pub struct LayeredConfigBuilder {
    layers: Vec<Layer>,
}

impl LayeredConfigBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a layer.
    pub fn with_layer(mut self, kind: LayerKind, source: Arc<dyn ConfigSource>) -> Self {
        self.layers.push(Layer::new(kind, source));
        self
    }

    /// Composes the configuration.
    pub fn build(self) -> LayeredConfig {
        LayeredConfig::new(self.layers)
    }
}
