// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process environment as a configuration source.
//!
//! Variable names are normalized into property keys: an optional prefix is
//! stripped, then the name is optionally lowercased and its underscores turned
//! into dots. `APP_VERSION` thus becomes `app.version` under
//! [`EnvVarAdapter::system`].

use crate::domain::{ConfigKey, ConfigValue, Result};
use crate::ports::ConfigSource;
use std::collections::BTreeMap;
use std::env;
use std::sync::{RwLock, RwLockReadGuard};

/// Variables with longer names are skipped.
const MAX_ENV_KEY_LEN: usize = 512;

/// Variables with longer values are skipped.
const MAX_ENV_VALUE_LEN: usize = 1_048_576;

/// Configuration source reading environment variables.
///
/// Together with [`CommandLineAdapter`](crate::adapters::CommandLineAdapter)
/// it makes up the system layer, the highest-precedence layer of a built
/// configuration. The environment is captured when the adapter is created and
/// again on every [`reload`](ConfigSource::reload).
///
/// # Examples
///
/// ```rust
/// use layercfg::adapters::EnvVarAdapter;
/// use layercfg::ports::ConfigSource;
///
/// let system = EnvVarAdapter::system();
/// assert_eq!(system.name(), "env");
///
/// // Only MYAPP_* variables, with the prefix removed.
/// let scoped = EnvVarAdapter::with_prefix("MYAPP_");
/// ```
#[derive(Debug)]
pub struct EnvVarAdapter {
    prefix: Option<String>,
    lowercase_keys: bool,
    replace_underscores: bool,
    captured: bool,
    values: RwLock<BTreeMap<String, String>>,
}

impl EnvVarAdapter {
    /// Reads every variable, replacing underscores with dots.
    pub fn new() -> Self {
        Self::configured(None)
    }

    /// Reads only variables starting with `prefix`, which is stripped from
    /// the resulting keys.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self::configured(Some(prefix.into()))
    }

    /// The adapter used for the system layer: every variable, keys
    /// lowercased with underscores replaced by dots.
    pub fn system() -> Self {
        Self::new().lowercase_keys(true)
    }

    /// Sets whether names are lowercased.
    pub fn lowercase_keys(mut self, enabled: bool) -> Self {
        self.lowercase_keys = enabled;
        self.capture();
        self
    }

    /// Sets whether underscores become dots. Enabled by default.
    pub fn replace_underscores(mut self, enabled: bool) -> Self {
        self.replace_underscores = enabled;
        self.capture();
        self
    }

    /// An adapter serving fixed values instead of the process environment.
    ///
    /// ```rust
    /// use layercfg::adapters::EnvVarAdapter;
    /// use layercfg::ports::ConfigSource;
    /// use std::collections::BTreeMap;
    ///
    /// let adapter = EnvVarAdapter::with_values(BTreeMap::from([
    ///     ("db.host".to_string(), "localhost".to_string()),
    /// ]));
    /// assert_eq!(adapter.get_str("db.host").unwrap().unwrap().as_str(), "localhost");
    /// ```
    pub fn with_values(values: BTreeMap<String, String>) -> Self {
        Self {
            prefix: None,
            lowercase_keys: false,
            replace_underscores: false,
            captured: false,
            values: RwLock::new(values),
        }
    }

    fn configured(prefix: Option<String>) -> Self {
        let mut adapter = Self {
            prefix,
            lowercase_keys: false,
            replace_underscores: true,
            captured: true,
            values: RwLock::new(BTreeMap::new()),
        };
        adapter.capture();
        adapter
    }

    /// Maps a variable name to its property key, or `None` if it is filtered out.
    fn normalize(&self, name: &str) -> Option<String> {
        let name = match &self.prefix {
            Some(prefix) => name.strip_prefix(prefix.as_str())?,
            None => name,
        };
        if name.is_empty() {
            return None;
        }
        let mut key = if self.lowercase_keys {
            name.to_lowercase()
        } else {
            name.to_string()
        };
        if self.replace_underscores {
            key = key.replace('_', ".");
        }
        Some(key)
    }

    fn collect<I>(&self, vars: I) -> BTreeMap<String, String>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut values = BTreeMap::new();
        for (name, value) in vars {
            if name.len() > MAX_ENV_KEY_LEN || value.len() > MAX_ENV_VALUE_LEN {
                tracing::debug!("Skipping oversized environment variable ({} bytes)", name.len());
                continue;
            }
            if let Some(key) = self.normalize(&name) {
                values.insert(key, value);
            }
        }
        values
    }

    fn capture(&mut self) {
        if !self.captured {
            return;
        }
        let values = self.collect(env::vars());
        tracing::debug!(
            "Captured {} environment variables (prefix={:?})",
            values.len(),
            self.prefix
        );
        *self
            .values
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = values;
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, String>> {
        self.values
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for EnvVarAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigSource for EnvVarAdapter {
    fn name(&self) -> &str {
        "env"
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
        if !self.captured {
            return Ok(());
        }
        let fresh = self.collect(env::vars());
        *self
            .values
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = fresh;
        Ok(())
    }

    fn snapshot(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.read().clone())
    }
}
