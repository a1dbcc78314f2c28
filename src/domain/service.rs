// SPDX-License-Identifier: MIT OR Apache-2.0

//! The read-only configuration interface consumed by the rest of an application.

use crate::domain::{ConfigError, ConfigKey, ConfigValue, Result};

/// A queryable, read-only configuration.
///
/// Implementors supply [`get`](ConfigurationService::get),
/// [`keys`](ConfigurationService::keys) and
/// [`reload`](ConfigurationService::reload); the typed accessors are derived
/// from `get`.
///
/// # Examples
///
/// ```rust
/// use layercfg::domain::{ConfigError, ConfigKey, ConfigValue, ConfigurationService, Result};
///
/// struct Fixed;
///
/// impl ConfigurationService for Fixed {
///     fn get(&self, key: &ConfigKey) -> Result<ConfigValue> {
///         match key.as_str() {
///             "server.port" => Ok(ConfigValue::from("8080")),
///             _ => Err(ConfigError::ConfigKeyNotFound { key: key.to_string() }),
///         }
///     }
///
///     fn keys(&self) -> Vec<ConfigKey> {
///         vec![ConfigKey::from("server.port")]
///     }
///
///     fn reload(&self) -> Result<()> {
///         Ok(())
///     }
/// }
///
/// let config = Fixed;
/// assert_eq!(config.get_int("server.port").unwrap(), 8080);
/// assert!(!config.contains_key(&ConfigKey::from("missing")));
/// ```
pub trait ConfigurationService: Send + Sync {
    /// Returns the value of `key` from the highest-priority layer that has it.
    fn get(&self, key: &ConfigKey) -> Result<ConfigValue>;

    /// Returns every key visible in the configuration, each once.
    fn keys(&self) -> Vec<ConfigKey>;

    /// Refreshes every layer that supports refreshing.
    fn reload(&self) -> Result<()>;

    /// Returns the value of `key` or `default` when it is absent.
    fn get_or_default(&self, key: &ConfigKey, default: &str) -> ConfigValue {
        self.get(key).unwrap_or_else(|_| ConfigValue::from(default))
    }

    /// Returns `true` if any layer provides `key`.
    fn contains_key(&self, key: &ConfigKey) -> bool {
        self.get(key).is_ok()
    }

    /// Returns the value of `key` as a `String`.
    fn get_string(&self, key: &str) -> Result<String> {
        self.get(&ConfigKey::from(key)).map(String::from)
    }

    /// Returns the value of `key` as an integer.
    fn get_int(&self, key: &str) -> Result<i64> {
        self.get(&ConfigKey::from(key))?.as_i64(key)
    }

    /// Returns the value of `key` as a boolean.
    fn get_bool(&self, key: &str) -> Result<bool> {
        self.get(&ConfigKey::from(key))?.as_bool(key)
    }

    /// Returns the value of `key` as a boolean, or `default` when it is absent.
    ///
    /// A present but unparseable value is still an error.
    fn get_bool_or(&self, key: &str, default: bool) -> Result<bool> {
        match self.get(&ConfigKey::from(key)) {
            Ok(value) => value.as_bool(key),
            Err(ConfigError::ConfigKeyNotFound { .. }) => Ok(default),
            Err(e) => Err(e),
        }
    }
}
