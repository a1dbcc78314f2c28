// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local file configuration source adapter.
//!
//! Reads a `.properties` (or, with the `yaml` feature, `.yaml`/`.yml`) file into
//! a flat layer. The parser is selected by file extension.

use crate::adapters::PropertiesParser;
use crate::domain::{ConfigError, ConfigKey, ConfigValue, Result};
use crate::ports::{ConfigParser, ConfigSource};
use directories::ProjectDirs;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Maximum allowed size for a configuration file (10MB).
const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Default file name used by [`FileAdapter::from_default_location`].
pub const DEFAULT_FILE_NAME: &str = "config.properties";

/// Returns the parser responsible for `name`'s extension.
///
/// ```rust
/// use layercfg::adapters::file::parser_for;
///
/// assert!(parser_for("app.properties").is_ok());
/// assert!(parser_for("app.ini").is_err());
/// ```
pub fn parser_for(name: &str) -> Result<Box<dyn ConfigParser>> {
    let extension = Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("");

    let properties = PropertiesParser::new();
    if properties.supports(extension) {
        return Ok(Box::new(properties));
    }

    #[cfg(feature = "yaml")]
    {
        let yaml = crate::adapters::YamlParser::new();
        if yaml.supports(extension) {
            return Ok(Box::new(yaml));
        }
    }

    Err(ConfigError::ResourceLoadFailure {
        resource: name.to_string(),
        message: format!("no parser for extension '{}'", extension),
        source: None,
    })
}

/// Returns the environment-specific sibling of `path`.
///
/// `conf/app.properties` with environment `prod` becomes
/// `conf/app.prod.properties`. Returns `None` when `path` has no extension.
///
/// ```rust
/// use layercfg::adapters::file::env_override_path;
/// use std::path::Path;
///
/// let sibling = env_override_path(Path::new("conf/app.properties"), "unittest").unwrap();
/// assert_eq!(sibling, Path::new("conf/app.unittest.properties"));
/// ```
pub fn env_override_path(path: &Path, environment: &str) -> Option<PathBuf> {
    let file_name = path.file_name()?.to_str()?;
    let (stem, extension) = file_name.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    Some(path.with_file_name(format!("{}.{}.{}", stem, environment, extension)))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}

fn read_values(path: &Path) -> Result<BTreeMap<String, String>> {
    let load_failure = |message: String, source: Option<std::io::Error>| {
        ConfigError::ResourceLoadFailure {
            resource: path.display().to_string(),
            message,
            source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
        }
    };

    // Check file size before reading to refuse oversized files
    let metadata = fs::metadata(path)
        .map_err(|e| load_failure("failed to read file metadata".to_string(), Some(e)))?;

    if metadata.len() > MAX_FILE_SIZE {
        return Err(load_failure(
            format!(
                "configuration file too large: {} bytes (max {} bytes)",
                metadata.len(),
                MAX_FILE_SIZE
            ),
            None,
        ));
    }

    let content = fs::read_to_string(path)
        .map_err(|e| load_failure("failed to read configuration file".to_string(), Some(e)))?;

    let parser = parser_for(&display_name(path))?;
    parser.parse(&content).map_err(|e| ConfigError::ResourceLoadFailure {
        resource: path.display().to_string(),
        message: e.to_string(),
        source: Some(Box::new(e)),
    })
}

/// Configuration source adapter for local files.
///
/// # Examples
///
/// ```rust,no_run
/// use layercfg::adapters::FileAdapter;
/// use layercfg::ports::ConfigSource;
///
/// let adapter = FileAdapter::from_file("/etc/myapp/app.properties").unwrap();
/// let port = adapter.get_str("server.port").unwrap();
/// ```
#[derive(Debug)]
pub struct FileAdapter {
    /// Canonical path to the file
    file_path: PathBuf,
    /// Source name used in logs
    name: String,
    /// Parsed configuration values
    values: RwLock<BTreeMap<String, String>>,
}

impl FileAdapter {
    /// Loads the file at `path`.
    ///
    /// Fails with [`ConfigError::ResourceLoadFailure`] if the file is missing,
    /// unreadable, too large, of an unknown format, or malformed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let requested = path.as_ref();
        let file_path = requested
            .canonicalize()
            .map_err(|e| ConfigError::ResourceLoadFailure {
                resource: requested.display().to_string(),
                message: "invalid or inaccessible path".to_string(),
                source: Some(Box::new(e)),
            })?;

        let values = read_values(&file_path)?;
        tracing::debug!(
            "Loaded {} properties from {}",
            values.len(),
            file_path.display()
        );

        Ok(Self {
            name: format!("file:{}", display_name(&file_path)),
            file_path,
            values: RwLock::new(values),
        })
    }

    /// Loads `file_name` from the OS-appropriate configuration directory of
    /// the application.
    ///
    /// ```rust,no_run
    /// use layercfg::adapters::FileAdapter;
    ///
    /// let adapter = FileAdapter::from_default_location("myapp", "com.example", None).unwrap();
    /// ```
    pub fn from_default_location(
        app_name: &str,
        qualifier: &str,
        file_name: Option<&str>,
    ) -> Result<Self> {
        Self::from_file(Self::default_location(app_name, qualifier, file_name)?)
    }

    /// Returns the OS-appropriate path of an application configuration file.
    pub fn default_location(
        app_name: &str,
        qualifier: &str,
        file_name: Option<&str>,
    ) -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from(qualifier, "", app_name).ok_or_else(|| {
            ConfigError::ResourceLoadFailure {
                resource: app_name.to_string(),
                message: "failed to determine project directories".to_string(),
                source: None,
            }
        })?;

        Ok(proj_dirs
            .config_dir()
            .join(file_name.unwrap_or(DEFAULT_FILE_NAME)))
    }

    /// Returns the path to the configuration file.
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, String>> {
        self.values
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ConfigSource for FileAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &ConfigKey) -> Result<Option<ConfigValue>> {
        Ok(self
            .read()
            .get(key.as_str())
            .map(|v| ConfigValue::from(v.as_str())))
    }

    fn all_keys(&self) -> Result<Vec<ConfigKey>> {
        Ok(self.read().keys().map(|k| ConfigKey::from(k.as_str())).collect())
    }

    fn reload(&self) -> Result<()> {
        let values = read_values(&self.file_path)?;
        let mut guard = self
            .values
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = values;
        Ok(())
    }

    fn snapshot(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.read().clone())
    }
}
