// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`RemoteConfigProvider`] over a [`PathStore`].

use crate::domain::{AppIdentity, ConfigError, ExclusionFilter, Result};
use crate::ports::{PathStore, RemoteConfigProvider, RemoteLayers};
use crate::service::builder::{PUBLISH_DEFAULTS_KEY, VERSION_KEY};
use crate::service::dynamic_source::DynamicInstanceConfigSource;
use crate::service::remote_source::RemoteConfigSource;
use crate::service::writer::ConfigWriter;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Excludes instance metadata (`instance.*`), the resolved `app.version` and
/// the local `remote.publish.defaults` flag.
pub fn exclude_runtime_keys() -> ExclusionFilter {
    Arc::new(|key: &str, _: &str| {
        key.starts_with("instance.") || key == VERSION_KEY || key == PUBLISH_DEFAULTS_KEY
    })
}

/// Serves and publishes remote configuration using the path layout
/// `/{environment}/{name}/{version}/config` for the shared layer and
/// `/{environment}/{name}/{version}/{instance_id}-config` for the instance
/// layer.
///
/// # Examples
///
/// ```rust
/// use layercfg::adapters::MemoryPathStore;
/// use layercfg::domain::AppIdentity;
/// use layercfg::ports::RemoteConfigProvider;
/// use layercfg::service::PathStoreConfigProvider;
/// use std::collections::BTreeMap;
/// use std::sync::Arc;
///
/// let provider = PathStoreConfigProvider::new(Arc::new(MemoryPathStore::new()));
/// let app = AppIdentity::new("testapp", "unittest", "1.0.0").unwrap();
///
/// assert!(provider.fetch(&app, "local").is_err());
///
/// let config = BTreeMap::from([("k".to_string(), "v".to_string())]);
/// provider.write(&app, &config, false).unwrap();
///
/// let layers = provider.fetch(&app, "local").unwrap();
/// assert_eq!(layers.base.get_str("k").unwrap().unwrap().as_str(), "v");
/// ```
#[derive(Clone)]
pub struct PathStoreConfigProvider {
    store: Arc<dyn PathStore>,
    exclude: ExclusionFilter,
}

impl PathStoreConfigProvider {
    /// Creates a provider that never publishes runtime-derived keys.
    pub fn new(store: Arc<dyn PathStore>) -> Self {
        Self {
            store,
            exclude: exclude_runtime_keys(),
        }
    }

    /// Replaces the publication exclusion filter.
    pub fn with_exclusion(mut self, exclude: ExclusionFilter) -> Self {
        self.exclude = exclude;
        self
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn PathStore> {
        &self.store
    }

    /// Publishes `config` as the override layer of one instance.
    pub fn write_instance(
        &self,
        app: &AppIdentity,
        instance_id: &str,
        config: &BTreeMap<String, String>,
        allow_overwrite: bool,
    ) -> Result<()> {
        self.writer()
            .write(&app.instance_config_path(instance_id), config, allow_overwrite)
            .map(|_| ())
    }

    fn writer(&self) -> ConfigWriter {
        ConfigWriter::new(Arc::clone(&self.store)).with_exclusion(Arc::clone(&self.exclude))
    }
}

impl std::fmt::Debug for PathStoreConfigProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathStoreConfigProvider")
            .finish_non_exhaustive()
    }
}

impl RemoteConfigProvider for PathStoreConfigProvider {
    fn fetch(&self, app: &AppIdentity, instance_id: &str) -> Result<RemoteLayers> {
        let config_path = app.config_path();
        if !self.store.exists(&config_path)? {
            return Err(ConfigError::RemoteNotFound { path: config_path });
        }

        let base = RemoteConfigSource::start(Arc::clone(&self.store), &config_path)?;
        let instance = DynamicInstanceConfigSource::start(
            Arc::clone(&self.store),
            &app.base_path(),
            &AppIdentity::instance_config_node(instance_id),
        )?;

        tracing::info!(
            "Fetched remote configuration for {} (instance {})",
            app.base_path(),
            instance_id
        );
        Ok(RemoteLayers {
            base: Arc::new(base),
            instance: Arc::new(instance),
        })
    }

    fn write(
        &self,
        app: &AppIdentity,
        config: &BTreeMap<String, String>,
        allow_overwrite: bool,
    ) -> Result<()> {
        self.writer()
            .write(&app.config_path(), config, allow_overwrite)
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryPathStore;

    fn app() -> AppIdentity {
        AppIdentity::new("testapp", "unittest", "1.0.0").unwrap()
    }

    #[test]
    fn test_fetch_missing_is_remote_not_found() {
        let store = Arc::new(MemoryPathStore::new());
        let provider = PathStoreConfigProvider::new(store.clone());
        match provider.fetch(&app(), "local") {
            Err(ConfigError::RemoteNotFound { path }) => {
                assert_eq!(path, "/unittest/testapp/1.0.0/config")
            }
            other => panic!("expected RemoteNotFound, got {:?}", other.map(|_| ())),
        }
        assert_eq!(store.watch_count(), 0);
    }

    #[test]
    fn test_write_skips_runtime_keys() {
        let store = Arc::new(MemoryPathStore::new());
        let provider = PathStoreConfigProvider::new(store.clone());
        let config = BTreeMap::from([
            ("app.version".to_string(), "1.0.0".to_string()),
            ("instance.id".to_string(), "local".to_string()),
            ("remote.publish.defaults".to_string(), "true".to_string()),
            ("db.host".to_string(), "db1".to_string()),
        ]);
        provider.write(&app(), &config, false).unwrap();

        assert_eq!(
            store.get_children("/unittest/testapp/1.0.0/config").unwrap(),
            vec!["db.host"]
        );
    }

    #[test]
    fn test_instance_layer_follows_node() {
        let store = Arc::new(MemoryPathStore::new());
        let provider = PathStoreConfigProvider::new(store.clone());
        provider
            .write(&app(), &BTreeMap::from([("k".to_string(), "base".to_string())]), false)
            .unwrap();

        let layers = provider.fetch(&app(), "i-1").unwrap();
        assert!(layers.instance.get_str("k").unwrap().is_none());

        provider
            .write_instance(
                &app(),
                "i-1",
                &BTreeMap::from([("k".to_string(), "mine".to_string())]),
                false,
            )
            .unwrap();
        assert_eq!(
            layers.instance.get_str("k").unwrap().unwrap().as_str(),
            "mine"
        );
    }
}
