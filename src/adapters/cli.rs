// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command-line argument configuration source adapter.
//!
//! This module provides an adapter that reads configuration overrides from
//! command-line arguments.

use crate::domain::{ConfigKey, ConfigValue, Result};
use crate::ports::ConfigSource;
use std::collections::BTreeMap;

/// Configuration source adapter for command-line arguments.
///
/// This adapter reads configuration overrides from command-line arguments. It
/// supports the following argument formats:
/// - `-Dkey=value`: System property form; `-Dkey` alone sets an empty value
/// - `--key=value`: Long form with equals sign
/// - `--key value`: Long form with space-separated value
///
/// Anything else (positional arguments, short flags) is ignored, so the
/// adapter can be fed the full argument list of an application that parses
/// its own flags.
///
/// # Examples
///
/// ```rust
/// use layercfg::adapters::CommandLineAdapter;
/// use layercfg::ports::ConfigSource;
///
/// let args = vec!["-Dapp.version=2.0.0", "--database.host=localhost", "--port", "5432"];
/// let adapter = CommandLineAdapter::from_args(args);
/// assert_eq!(adapter.get_str("app.version").unwrap().unwrap().as_str(), "2.0.0");
/// ```
#[derive(Debug, Clone, Default)]
pub struct CommandLineAdapter {
    /// Parsed configuration values
    values: BTreeMap<String, String>,
}

impl CommandLineAdapter {
    /// Creates a new command-line adapter with no arguments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new command-line adapter from a vector of arguments.
    pub fn from_args<S: AsRef<str>>(args: Vec<S>) -> Self {
        let mut adapter = Self::new();
        adapter.parse_args(&args);
        adapter
    }

    /// Creates a new command-line adapter from the process's command-line arguments.
    ///
    /// This skips the first argument (the program name) and parses the rest.
    ///
    /// ```rust,no_run
    /// use layercfg::adapters::CommandLineAdapter;
    ///
    /// let adapter = CommandLineAdapter::from_env_args();
    /// ```
    pub fn from_env_args() -> Self {
        let args: Vec<String> = std::env::args().skip(1).collect();
        Self::from_args(args)
    }

    /// Parses command-line arguments and populates the values map.
    fn parse_args<S: AsRef<str>>(&mut self, args: &[S]) {
        let mut i = 0;
        while i < args.len() {
            let arg = args[i].as_ref();
            i += 1;

            // Handle -Dkey=value format
            if let Some(property) = arg.strip_prefix("-D") {
                let (key, value) = property.split_once('=').unwrap_or((property, ""));
                if !key.is_empty() {
                    self.values.insert(key.to_string(), value.to_string());
                }
                continue;
            }

            let Some(flag) = arg.strip_prefix("--") else {
                continue;
            };

            // Handle --key=value format
            if let Some((key, value)) = flag.split_once('=') {
                if !key.is_empty() {
                    self.values.insert(key.to_string(), value.to_string());
                }
                continue;
            }

            // Handle --key value format; a following flag is not a value
            if flag.is_empty() {
                continue;
            }
            if let Some(next) = args.get(i).map(AsRef::as_ref) {
                if !next.starts_with('-') {
                    self.values.insert(flag.to_string(), next.to_string());
                    i += 1;
                }
            }
        }

        tracing::debug!("Parsed {} command-line overrides", self.values.len());
    }
}

impl ConfigSource for CommandLineAdapter {
    fn name(&self) -> &str {
        "cli"
    }

    fn get(&self, key: &ConfigKey) -> Result<Option<ConfigValue>> {
        Ok(self
            .values
            .get(key.as_str())
            .map(|v| ConfigValue::from(v.as_str())))
    }

    fn all_keys(&self) -> Result<Vec<ConfigKey>> {
        Ok(self
            .values
            .keys()
            .map(|k| ConfigKey::from(k.as_str()))
            .collect())
    }

    fn snapshot(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.values.clone())
    }
}
