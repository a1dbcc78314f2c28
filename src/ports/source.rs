// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration source trait definition.
//!
//! A `ConfigSource` is one layer's worth of key-value pairs: a local file, the
//! process environment, a remote sub-tree. Where a layer sits in the
//! precedence stack is decided at composition time by its
//! [`LayerKind`](crate::domain::LayerKind), not by the source.

use crate::domain::{ConfigKey, ConfigValue, Result};
use std::collections::BTreeMap;

/// A trait for configuration sources.
///
/// Sources are shared between the composed configuration and their owners
/// (a remote layer is also held by whoever closes it), so every method takes
/// `&self` and mutable state lives behind interior locks.
///
/// # Examples
///
/// ```rust
/// use layercfg::ports::ConfigSource;
/// use layercfg::domain::{ConfigKey, ConfigValue, Result};
///
/// struct MySource;
///
/// impl ConfigSource for MySource {
///     fn name(&self) -> &str {
///         "my-source"
///     }
///
///     fn get(&self, key: &ConfigKey) -> Result<Option<ConfigValue>> {
///         Ok((key.as_str() == "app.name").then(|| ConfigValue::from("MyApp")))
///     }
///
///     fn all_keys(&self) -> Result<Vec<ConfigKey>> {
///         Ok(vec![ConfigKey::from("app.name")])
///     }
/// }
///
/// let source = MySource;
/// assert!(source.get_str("app.name").unwrap().is_some());
/// assert_eq!(source.snapshot().unwrap().len(), 1);
/// ```
pub trait ConfigSource: Send + Sync {
    /// Returns the name of this source, used in logs and error messages.
    fn name(&self) -> &str;

    /// Retrieves the value for `key`.
    ///
    /// Returns `Ok(None)` if this source does not define the key.
    fn get(&self, key: &ConfigKey) -> Result<Option<ConfigValue>>;

    /// Returns every key defined by this source.
    fn all_keys(&self) -> Result<Vec<ConfigKey>>;

    /// Re-reads the source from its backing storage.
    ///
    /// Sources that cannot change, or that are kept current by a watch, keep
    /// the default no-op.
    fn reload(&self) -> Result<()> {
        Ok(())
    }

    /// Releases watches and other resources held by the source.
    fn close(&self) -> Result<()> {
        Ok(())
    }

    /// Retrieves a value for a string key.
    fn get_str(&self, key: &str) -> Result<Option<ConfigValue>> {
        self.get(&ConfigKey::from(key))
    }

    /// Returns every key-value pair of this source.
    fn snapshot(&self) -> Result<BTreeMap<String, String>> {
        let mut result = BTreeMap::new();
        for key in self.all_keys()? {
            if let Some(value) = self.get(&key)? {
                result.insert(key.into_string(), value.into());
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        reloads: AtomicUsize,
    }

    impl ConfigSource for CountingSource {
        fn name(&self) -> &str {
            "counting"
        }

        fn get(&self, key: &ConfigKey) -> Result<Option<ConfigValue>> {
            Ok((key.as_str() == "k").then(|| ConfigValue::from("v")))
        }

        fn all_keys(&self) -> Result<Vec<ConfigKey>> {
            Ok(vec![ConfigKey::from("k")])
        }

        fn reload(&self) -> Result<()> {
            self.reloads.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_reload_through_shared_reference() {
        let source = CountingSource {
            reloads: AtomicUsize::new(0),
        };
        source.reload().unwrap();
        source.reload().unwrap();
        assert_eq!(source.reloads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_default_snapshot_and_close() {
        let source = CountingSource {
            reloads: AtomicUsize::new(0),
        };
        let snapshot = source.snapshot().unwrap();
        assert_eq!(snapshot.get("k").map(String::as_str), Some("v"));
        assert!(source.close().is_ok());
    }

    #[test]
    fn test_config_source_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Box<dyn ConfigSource>>();
    }
}
