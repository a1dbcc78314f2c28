// SPDX-License-Identifier: MIT OR Apache-2.0

//! Assembly of a [`LayeredConfig`] from local, system and remote layers.

use crate::adapters::{DefaultInstanceIdentity, MapSource, StaticModuleRegistry};
use crate::domain::{AppIdentity, ConfigError, ConfigValue, LayerKind, Result};
use crate::ports::{ConfigSource, InstanceIdentityProvider, ModuleScanner, RemoteConfigProvider};
use crate::service::active::install_active;
use crate::service::layered::{ConfigHandle, Layer, LayeredConfig};
use crate::service::loaders::{FileLayerLoader, LocalFileLayers, ModuleDefaultsLoader};
use std::path::PathBuf;
use std::sync::Arc;

/// Property holding the application version.
pub const VERSION_KEY: &str = "app.version";

/// Local property enabling publication of defaults when no remote
/// configuration exists yet.
pub const PUBLISH_DEFAULTS_KEY: &str = "remote.publish.defaults";

/// The system sources used when none are set explicitly: `-D`/`--` command
/// line overrides followed by the process environment.
pub fn default_system_sources() -> Vec<Arc<dyn ConfigSource>> {
    #[allow(unused_mut)]
    let mut sources: Vec<Arc<dyn ConfigSource>> = Vec::new();
    #[cfg(feature = "cli")]
    sources.push(Arc::new(crate::adapters::CommandLineAdapter::from_env_args()));
    #[cfg(feature = "env")]
    sources.push(Arc::new(crate::adapters::EnvVarAdapter::system()));
    sources
}

/// Builds the layered configuration of one application.
///
/// Precedence, highest first:
///
/// | with a remote provider   | without one              |
/// |--------------------------|--------------------------|
/// | system sources           | system sources           |
/// | `app.version` override   | `app.version` override   |
/// | instance metadata        | instance metadata        |
/// | remote instance layer    | local file env override  |
/// | remote base layer        | local file               |
/// | local file env override  | module defaults          |
/// | local file               |                          |
///
/// # Examples
///
/// ```rust
/// use layercfg::domain::ConfigurationService;
/// use layercfg::service::ConfigurationBuilder;
///
/// let config = ConfigurationBuilder::new("testapp", "unittest")
///     .add_system_configs(false)
///     .version("1.0.0")
///     .build()
///     .unwrap();
///
/// assert_eq!(config.get_string("app.version").unwrap(), "1.0.0");
/// assert_eq!(config.get_string("instance.id").unwrap(), "local");
/// ```
pub struct ConfigurationBuilder {
    name: String,
    environment: String,
    add_system_configs: bool,
    scan_module_configurations: bool,
    local_file: Option<PathBuf>,
    version: Option<String>,
    remote: Option<Arc<dyn RemoteConfigProvider>>,
    identity: Arc<dyn InstanceIdentityProvider>,
    system_sources: Option<Vec<Arc<dyn ConfigSource>>>,
    modules: Arc<dyn ModuleScanner>,
    install: bool,
}

impl ConfigurationBuilder {
    /// Starts a builder for application `name` in `environment`.
    pub fn new(name: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            environment: environment.into(),
            add_system_configs: true,
            scan_module_configurations: true,
            local_file: None,
            version: None,
            remote: None,
            identity: Arc::new(DefaultInstanceIdentity::default()),
            system_sources: None,
            modules: Arc::new(StaticModuleRegistry::new()),
            install: false,
        }
    }

    /// Whether the system layer (command line and environment) is included.
    /// Defaults to `true`.
    pub fn add_system_configs(mut self, enabled: bool) -> Self {
        self.add_system_configs = enabled;
        self
    }

    /// Whether module defaults are merged. Defaults to `true`.
    pub fn scan_module_configurations(mut self, enabled: bool) -> Self {
        self.scan_module_configurations = enabled;
        self
    }

    /// Sets the local configuration file. Its `{environment}` sibling is
    /// picked up automatically.
    pub fn local_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.local_file = Some(path.into());
        self
    }

    /// Sets the application version explicitly.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Sets where remote configuration is fetched from.
    pub fn remote_provider(mut self, provider: Arc<dyn RemoteConfigProvider>) -> Self {
        self.remote = Some(provider);
        self
    }

    /// Sets the provider of the instance metadata layer.
    pub fn instance_identity_provider(mut self, provider: Arc<dyn InstanceIdentityProvider>) -> Self {
        self.identity = provider;
        self
    }

    /// Adds a source to the system layer, replacing the defaults.
    pub fn system_source(mut self, source: Arc<dyn ConfigSource>) -> Self {
        self.system_sources.get_or_insert_with(Vec::new).push(source);
        self
    }

    /// Replaces the system layer sources. Earlier sources win.
    pub fn system_sources(mut self, sources: Vec<Arc<dyn ConfigSource>>) -> Self {
        self.system_sources = Some(sources);
        self
    }

    /// Sets the registry listing module default resources.
    pub fn module_scanner(mut self, scanner: Arc<dyn ModuleScanner>) -> Self {
        self.modules = scanner;
        self
    }

    /// Whether the result is installed as the process-wide active
    /// configuration. Defaults to `false`.
    pub fn install(mut self, enabled: bool) -> Self {
        self.install = enabled;
        self
    }

    /// Resolves every layer and composes the configuration.
    pub fn build(self) -> Result<ConfigHandle> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::InvalidIdentity { field: "name" });
        }
        if self.environment.trim().is_empty() {
            return Err(ConfigError::InvalidIdentity {
                field: "environment",
            });
        }

        let local = FileLayerLoader::load(self.local_file.as_deref(), &self.environment)?;
        let system = if self.add_system_configs {
            self.system_sources
                .clone()
                .unwrap_or_else(default_system_sources)
        } else {
            Vec::new()
        };

        let version = self.resolve_version(&system, &local)?;
        let app = AppIdentity::new(&self.name, &self.environment, &version)?;
        let instance = self.identity.instance_identity()?;

        let modules = if self.scan_module_configurations {
            Some(ModuleDefaultsLoader::load(self.modules.as_ref())?)
        } else {
            None
        };

        let mut layers: Vec<Layer> = system
            .into_iter()
            .map(|source| Layer::new(LayerKind::SystemEnv, source))
            .collect();
        layers.push(Layer::new(
            LayerKind::VersionOverride,
            Arc::new(MapSource::new("version").with(VERSION_KEY, version.as_str())),
        ));
        layers.push(Layer::new(
            LayerKind::InstanceMetadata,
            Arc::new(MapSource::from_map(
                "instance-metadata",
                instance.to_properties(),
            )),
        ));
        layers.push(Layer::new(
            LayerKind::LocalFileEnvOverride,
            Arc::clone(&local.env_override),
        ));
        layers.push(Layer::new(LayerKind::LocalFile, Arc::clone(&local.base)));

        match &self.remote {
            Some(provider) => {
                let remote = self.fetch_remote(provider.as_ref(), &app, &instance.instance_id, &local)?;
                layers.push(Layer::new(LayerKind::RemoteInstance, remote.instance));
                layers.push(Layer::new(LayerKind::RemoteBase, remote.base));
            }
            None => {
                if let Some(modules) = modules {
                    layers.push(Layer::new(LayerKind::ModuleDefaults, Arc::new(modules)));
                }
            }
        }

        let config = Arc::new(LayeredConfig::new(layers));
        tracing::info!(
            "Built configuration for {} with layers {:?}",
            app.base_path(),
            config.layer_names()
        );

        if self.install {
            if let Err(e) = install_active(Arc::clone(&config)) {
                if let Err(close_error) = config.close() {
                    tracing::warn!("Failed to close rejected configuration: {}", close_error);
                }
                return Err(e);
            }
        }
        Ok(config)
    }

    fn resolve_version(
        &self,
        system: &[Arc<dyn ConfigSource>],
        local: &LocalFileLayers,
    ) -> Result<String> {
        if let Some(version) = &self.version {
            return Ok(version.clone());
        }
        for source in system {
            if let Some(value) = source.get_str(VERSION_KEY)? {
                tracing::debug!("Version taken from {}", source.name());
                return Ok(value.into());
            }
        }
        local
            .lookup(VERSION_KEY)?
            .ok_or_else(|| ConfigError::MissingVersion {
                key: VERSION_KEY.to_string(),
            })
    }

    fn fetch_remote(
        &self,
        provider: &dyn RemoteConfigProvider,
        app: &AppIdentity,
        instance_id: &str,
        local: &LocalFileLayers,
    ) -> Result<crate::ports::RemoteLayers> {
        let path = match provider.fetch(app, instance_id) {
            Err(ConfigError::RemoteNotFound { path }) => path,
            other => return other,
        };

        let publish = match local.lookup(PUBLISH_DEFAULTS_KEY)? {
            Some(flag) => ConfigValue::from(flag).as_bool(PUBLISH_DEFAULTS_KEY)?,
            None => false,
        };
        if !publish {
            return Err(ConfigError::RemoteNotFound { path });
        }

        tracing::info!("No remote configuration at {}; publishing defaults", path);
        let defaults = self.defaults_only(app.version()).build()?;
        let snapshot = defaults.snapshot();
        defaults.close()?;

        match provider.write(app, &snapshot, false) {
            Ok(()) => {}
            Err(ConfigError::AlreadyExistsRefusal { path }) => {
                tracing::warn!("Defaults already published at {} by another writer", path);
            }
            Err(e) => return Err(e),
        }
        provider.fetch(app, instance_id)
    }

    fn defaults_only(&self, version: &str) -> ConfigurationBuilder {
        ConfigurationBuilder {
            name: self.name.clone(),
            environment: self.environment.clone(),
            add_system_configs: false,
            scan_module_configurations: self.scan_module_configurations,
            local_file: self.local_file.clone(),
            version: Some(version.to_string()),
            remote: None,
            identity: Arc::clone(&self.identity),
            system_sources: None,
            modules: Arc::clone(&self.modules),
            install: false,
        }
    }
}

impl std::fmt::Debug for ConfigurationBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigurationBuilder")
            .field("name", &self.name)
            .field("environment", &self.environment)
            .field("add_system_configs", &self.add_system_configs)
            .field("scan_module_configurations", &self.scan_module_configurations)
            .field("local_file", &self.local_file)
            .field("version", &self.version)
            .field("remote", &self.remote.is_some())
            .field("install", &self.install)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{MemoryPathStore, StaticModuleRegistry};
    use crate::domain::ConfigurationService;
    use crate::ports::PathStore;
    use crate::service::provider::PathStoreConfigProvider;
    use std::fs;
    use tempfile::TempDir;

    fn local_file(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("app.properties");
        fs::write(&path, contents).unwrap();
        path
    }

    fn builder() -> ConfigurationBuilder {
        ConfigurationBuilder::new("testapp", "unittest").add_system_configs(false)
    }

    #[test]
    fn test_blank_identity_rejected() {
        assert!(matches!(
            ConfigurationBuilder::new(" ", "unittest").version("1").build(),
            Err(ConfigError::InvalidIdentity { field: "name" })
        ));
        assert!(matches!(
            ConfigurationBuilder::new("app", "").version("1").build(),
            Err(ConfigError::InvalidIdentity {
                field: "environment"
            })
        ));
    }

    #[test]
    fn test_missing_version() {
        assert!(matches!(
            builder().build(),
            Err(ConfigError::MissingVersion { .. })
        ));
    }

    #[test]
    fn test_version_resolution_order() {
        let dir = TempDir::new().unwrap();
        let file = local_file(&dir, "app.version=3.0\n");

        let from_file = builder().local_file(&file).build().unwrap();
        assert_eq!(from_file.get_string(VERSION_KEY).unwrap(), "3.0");

        let from_system = ConfigurationBuilder::new("testapp", "unittest")
            .system_source(Arc::new(MapSource::new("cli").with(VERSION_KEY, "2.0")))
            .local_file(&file)
            .build()
            .unwrap();
        assert_eq!(from_system.get_string(VERSION_KEY).unwrap(), "2.0");

        let explicit = ConfigurationBuilder::new("testapp", "unittest")
            .system_source(Arc::new(MapSource::new("cli").with(VERSION_KEY, "2.0")))
            .local_file(&file)
            .version("1.0")
            .build()
            .unwrap();
        assert_eq!(explicit.get_string(VERSION_KEY).unwrap(), "1.0");
    }

    #[test]
    fn test_system_layer_wins() {
        let dir = TempDir::new().unwrap();
        let file = local_file(&dir, "k=file\n");
        let config = ConfigurationBuilder::new("testapp", "unittest")
            .system_source(Arc::new(MapSource::new("cli").with("k", "cli")))
            .local_file(&file)
            .version("1.0")
            .build()
            .unwrap();
        assert_eq!(config.get_string("k").unwrap(), "cli");
    }

    #[test]
    fn test_module_defaults_only_without_remote() {
        let modules = Arc::new(StaticModuleRegistry::new().register_embedded("m.properties", "m=1\n"));
        let config = builder()
            .version("1.0")
            .module_scanner(modules.clone())
            .build()
            .unwrap();
        assert_eq!(config.get_string("m").unwrap(), "1");

        let store = Arc::new(MemoryPathStore::new());
        let provider = Arc::new(PathStoreConfigProvider::new(store));
        provider
            .write(
                &AppIdentity::new("testapp", "unittest", "1.0").unwrap(),
                &Default::default(),
                false,
            )
            .unwrap();
        let remote = builder()
            .version("1.0")
            .module_scanner(modules)
            .remote_provider(provider)
            .build()
            .unwrap();
        assert!(!remote.contains_key(&"m".into()));
        remote.close().unwrap();
    }

    #[test]
    fn test_remote_not_found_without_publish_flag() {
        let provider = Arc::new(PathStoreConfigProvider::new(Arc::new(MemoryPathStore::new())));
        assert!(matches!(
            builder().version("1.0").remote_provider(provider).build(),
            Err(ConfigError::RemoteNotFound { .. })
        ));
    }

    #[test]
    fn test_publish_defaults_bootstraps_remote() {
        let dir = TempDir::new().unwrap();
        let file = local_file(&dir, "remote.publish.defaults=true\ndb.host=local-db\n");
        let store = Arc::new(MemoryPathStore::new());
        let provider = Arc::new(PathStoreConfigProvider::new(store.clone()));
        let modules = Arc::new(StaticModuleRegistry::new().register_embedded("m.properties", "pool.size=4\n"));

        let config = builder()
            .version("1.0.0")
            .local_file(&file)
            .module_scanner(modules)
            .remote_provider(provider)
            .build()
            .unwrap();

        let root = "/unittest/testapp/1.0.0/config";
        assert_eq!(store.get_data(&format!("{}/db.host", root)).unwrap(), "local-db");
        assert_eq!(store.get_data(&format!("{}/pool.size", root)).unwrap(), "4");
        assert!(!store.exists(&format!("{}/app.version", root)).unwrap());
        assert!(!store.exists(&format!("{}/instance.id", root)).unwrap());

        store.set_data(&format!("{}/pool.size", root), "8").unwrap();
        assert_eq!(config.get_string("pool.size").unwrap(), "8");
        config.close().unwrap();
    }
}
