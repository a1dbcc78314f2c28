// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration value type with type-safe conversions.
//!
//! Every layer stores values as strings (a remote node's data is a UTF-8 string,
//! a properties file line is a string), so `ConfigValue` wraps a `String` and
//! converts on access.

use crate::domain::errors::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A type-safe wrapper for configuration values.
///
/// # Examples
///
/// ```
/// use layercfg::domain::ConfigValue;
///
/// let value = ConfigValue::new("42".to_string());
/// assert_eq!(value.as_str(), "42");
/// assert_eq!(value.as_i32("test.key").unwrap(), 42);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigValue(String);

impl ConfigValue {
    /// Creates a new `ConfigValue` from a `String`.
    pub fn new(value: String) -> Self {
        ConfigValue(value)
    }

    /// Returns the value as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns an owned copy of the value.
    pub fn as_string(&self) -> String {
        self.0.clone()
    }

    /// Converts the value to a boolean.
    ///
    /// Recognizes the following values (case-insensitive, surrounding
    /// whitespace ignored):
    /// - `true`: "true", "yes", "1", "on"
    /// - `false`: "false", "no", "0", "off"
    ///
    /// ```
    /// use layercfg::domain::ConfigValue;
    ///
    /// assert!(ConfigValue::from("yes").as_bool("remote.publish.defaults").unwrap());
    /// assert!(!ConfigValue::from(" Off ").as_bool("remote.publish.defaults").unwrap());
    /// ```
    pub fn as_bool(&self, key: &str) -> Result<bool> {
        let normalized = self.0.trim().to_lowercase();
        match normalized.as_str() {
            "true" | "yes" | "1" | "on" => Ok(true),
            "false" | "no" | "0" | "off" => Ok(false),
            _ => normalized
                .parse::<bool>()
                .map_err(|e| ConfigError::from_parse_bool_error(key.to_string(), e)),
        }
    }

    /// Converts the value to an `i32`.
    pub fn as_i32(&self, key: &str) -> Result<i32> {
        self.0
            .trim()
            .parse::<i32>()
            .map_err(|e| ConfigError::from_parse_int_error(key.to_string(), e))
    }

    /// Converts the value to an `i64`.
    pub fn as_i64(&self, key: &str) -> Result<i64> {
        self.0
            .trim()
            .parse::<i64>()
            .map_err(|e| ConfigError::from_parse_int_error(key.to_string(), e))
    }

    /// Converts the value to an `f64`.
    pub fn as_f64(&self, key: &str) -> Result<f64> {
        self.0
            .trim()
            .parse::<f64>()
            .map_err(|e| ConfigError::from_parse_float_error(key.to_string(), e))
    }

    /// Parses the value into any type that implements `FromStr`.
    ///
    /// ```
    /// use layercfg::domain::ConfigValue;
    /// use std::net::IpAddr;
    ///
    /// let value = ConfigValue::from("127.0.0.1");
    /// let ip: IpAddr = value.parse("instance.private_ip").unwrap();
    /// assert!(ip.is_loopback());
    /// ```
    pub fn parse<T>(&self, key: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        self.0
            .parse::<T>()
            .map_err(|e| ConfigError::TypeConversionError {
                key: key.to_string(),
                target_type: std::any::type_name::<T>().to_string(),
                source: Box::new(e),
            })
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        ConfigValue(s)
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue(s.to_string())
    }
}

impl From<ConfigValue> for String {
    fn from(value: ConfigValue) -> Self {
        value.0
    }
}

impl AsRef<str> for ConfigValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::IpAddr;

    #[test]
    fn test_as_bool_true_variants() {
        for val in ["true", "True", "TRUE", "yes", "1", "on", "ON", " true "] {
            let value = ConfigValue::from(val);
            assert!(value.as_bool("test.key").unwrap(), "Failed for value: {}", val);
        }
    }

    #[test]
    fn test_as_bool_false_variants() {
        for val in ["false", "False", "no", "NO", "0", "off", "Off"] {
            let value = ConfigValue::from(val);
            assert!(!value.as_bool("test.key").unwrap(), "Failed for value: {}", val);
        }
    }

    #[test]
    fn test_as_bool_invalid() {
        let value = ConfigValue::from("maybe");
        assert!(value.as_bool("test.key").is_err());
    }

    #[test]
    fn test_as_i32() {
        assert_eq!(ConfigValue::from("42").as_i32("k").unwrap(), 42);
        assert_eq!(ConfigValue::from("-42").as_i32("k").unwrap(), -42);
        assert_eq!(ConfigValue::from(" 7 ").as_i32("k").unwrap(), 7);
    }

    #[test]
    fn test_as_i32_invalid() {
        assert!(ConfigValue::from("not_a_number").as_i32("k").is_err());
        assert!(ConfigValue::from("3.14").as_i32("k").is_err());
    }

    #[test]
    fn test_as_i64_and_f64() {
        let value = ConfigValue::from("9223372036854775807");
        assert_eq!(value.as_i64("k").unwrap(), i64::MAX);
        assert_eq!(ConfigValue::from("2.5").as_f64("k").unwrap(), 2.5);
    }

    #[test]
    fn test_parse_custom_type() {
        let ip: IpAddr = ConfigValue::from("127.0.0.1").parse("k").unwrap();
        assert_eq!(ip.to_string(), "127.0.0.1");

        let result: Result<IpAddr> = ConfigValue::from("not_an_ip").parse("k");
        assert!(result.is_err());
    }

    #[test]
    fn test_whitespace_preserved_in_str() {
        let value = ConfigValue::from("  spaces  ");
        assert_eq!(value.as_str(), "  spaces  ");
    }
}
