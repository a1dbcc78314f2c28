// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration key newtype.
//!
//! Keys are flat, dot-separated strings such as `db.pool.size`. When a key is
//! stored in a coordination service it becomes the name of a single child node,
//! so it must be non-empty and must not contain `/`; [`ConfigKey::is_node_name`]
//! checks that.

use std::borrow::Borrow;
use std::fmt;

/// A type-safe wrapper for configuration keys.
///
/// # Examples
///
/// ```
/// use layercfg::domain::ConfigKey;
///
/// let key = ConfigKey::from("database.host");
/// assert_eq!(key.as_str(), "database.host");
/// assert!(key.is_node_name());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConfigKey(String);

impl ConfigKey {
    /// Creates a new `ConfigKey` from a `String`.
    pub fn new(key: String) -> Self {
        ConfigKey(key)
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Converts the `ConfigKey` into its inner `String`.
    pub fn into_string(self) -> String {
        self.0
    }

    /// Returns `true` if the key can be stored as a single path-store node name.
    ///
    /// ```
    /// use layercfg::domain::ConfigKey;
    ///
    /// assert!(ConfigKey::from("server.port").is_node_name());
    /// assert!(!ConfigKey::from("a/b").is_node_name());
    /// assert!(!ConfigKey::from("").is_node_name());
    /// ```
    pub fn is_node_name(&self) -> bool {
        is_valid_node_name(&self.0)
    }
}

/// Returns `true` if `name` is usable as one path segment.
pub(crate) fn is_valid_node_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('/') && name != "." && name != ".."
}

impl From<String> for ConfigKey {
    fn from(s: String) -> Self {
        ConfigKey(s)
    }
}

impl From<&str> for ConfigKey {
    fn from(s: &str) -> Self {
        ConfigKey(s.to_string())
    }
}

impl From<ConfigKey> for String {
    fn from(key: ConfigKey) -> Self {
        key.0
    }
}

impl AsRef<str> for ConfigKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ConfigKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
