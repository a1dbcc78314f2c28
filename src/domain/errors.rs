// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the configuration crate.
//!
//! This module defines every error that can surface while composing, reading,
//! or publishing configuration. All errors use `thiserror` for proper error
//! handling and conversion. Every variant is fatal at the point where it is
//! raised; only connection establishment to a coordination service is retried
//! (see [`crate::adapters::retry`]).

use std::num::{ParseFloatError, ParseIntError};
use std::str::ParseBoolError;
use thiserror::Error;

/// The main error type for configuration operations.
///
/// This enum is marked as `#[non_exhaustive]` to allow for future additions
/// without breaking backwards compatibility.
///
/// # Examples
///
/// ```
/// use layercfg::domain::errors::ConfigError;
///
/// fn get_config_value() -> Result<String, ConfigError> {
///     Err(ConfigError::ConfigKeyNotFound {
///         key: "database.host".to_string(),
///     })
/// }
/// ```
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The requested configuration key was not found in any layer.
    #[error("Configuration key not found: {key}")]
    ConfigKeyNotFound {
        /// The key that was not found
        key: String,
    },

    /// Failed to convert a configuration value to the requested type.
    #[error(
        "Failed to convert configuration value for key '{key}' to type {target_type}: {source}"
    )]
    TypeConversionError {
        /// The key being converted
        key: String,
        /// The target type name
        target_type: String,
        /// The underlying conversion error
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// No application version was supplied explicitly, as a process-level
    /// override, or in the local configuration file.
    #[error("Application version is not set (checked explicit value, '{key}' override and local file)")]
    MissingVersion {
        /// The property key that was consulted
        key: String,
    },

    /// One of the identity fields required for remote resolution is blank.
    #[error("Application identity field '{field}' must not be blank")]
    InvalidIdentity {
        /// The blank field
        field: &'static str,
    },

    /// Two module default contributions declare the same key.
    #[error("Duplicate default key '{key}' declared by both '{first}' and '{second}'")]
    DuplicateModuleKey {
        /// The conflicting key
        key: String,
        /// The resource that declared the key first
        first: String,
        /// The resource that declared it again
        second: String,
    },

    /// A local file or module resource could not be read or parsed.
    #[error("Failed to load configuration resource '{resource}': {message}")]
    ResourceLoadFailure {
        /// The resource (file path or registered resource name)
        resource: String,
        /// The error message
        message: String,
        /// The underlying error, if any
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The coordination service could not be reached within the retry budget.
    #[error("Failed to connect to coordination service after {attempts} attempt(s): {message}")]
    RemoteConnectFailure {
        /// Number of connection attempts made
        attempts: u32,
        /// The error message
        message: String,
        /// The last underlying error, if any
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// No remote configuration exists for the requested application.
    #[error("Remote configuration not found at '{path}'")]
    RemoteNotFound {
        /// The path that was expected to exist
        path: String,
    },

    /// A publish was refused because the target already exists and overwriting
    /// was not allowed.
    #[error("Refusing to overwrite existing remote configuration at '{path}'")]
    AlreadyExistsRefusal {
        /// The existing target path
        path: String,
    },

    /// A path store operation failed.
    #[error("Path store operation '{operation}' on '{path}' failed: {message}")]
    PathOperationFailure {
        /// The operation name (create, set_data, delete, ...)
        operation: &'static str,
        /// The path the operation targeted
        path: String,
        /// The error message
        message: String,
        /// The underlying error, if any
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A node could not be created because it already exists.
    #[error("Node already exists: {path}")]
    NodeExists {
        /// The existing node path
        path: String,
    },

    /// A node required by an operation does not exist.
    #[error("Node does not exist: {path}")]
    NoNode {
        /// The missing node path
        path: String,
    },

    /// An active configuration is already installed for this process.
    #[error("An active configuration is already installed; reset it before installing another")]
    AlreadyInstalled,

    /// An error occurred in a configuration source.
    #[error("Configuration source '{source_name}' error: {message}")]
    SourceError {
        /// The name of the source that encountered the error
        source_name: String,
        /// The error message
        message: String,
        /// The underlying error, if any
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Failed to parse a configuration file or value.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// The error message
        message: String,
        /// The underlying parsing error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An I/O error occurred while reading configuration.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ConfigError {
    /// Creates a TypeConversionError from a ParseIntError.
    pub fn from_parse_int_error(key: String, err: ParseIntError) -> Self {
        ConfigError::TypeConversionError {
            key,
            target_type: "integer".to_string(),
            source: Box::new(err),
        }
    }

    /// Creates a TypeConversionError from a ParseFloatError.
    pub fn from_parse_float_error(key: String, err: ParseFloatError) -> Self {
        ConfigError::TypeConversionError {
            key,
            target_type: "float".to_string(),
            source: Box::new(err),
        }
    }

    /// Creates a TypeConversionError from a ParseBoolError.
    pub fn from_parse_bool_error(key: String, err: ParseBoolError) -> Self {
        ConfigError::TypeConversionError {
            key,
            target_type: "boolean".to_string(),
            source: Box::new(err),
        }
    }

    /// Creates a PathOperationFailure without an underlying cause.
    pub fn path_failure(
        operation: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ConfigError::PathOperationFailure {
            operation,
            path: path.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Returns `true` if this is the store's "already exists" conflict signal.
    pub fn is_node_exists(&self) -> bool {
        matches!(self, ConfigError::NodeExists { .. })
    }

    /// Returns `true` if this is the store's "no such node" signal.
    pub fn is_no_node(&self) -> bool {
        matches!(self, ConfigError::NoNode { .. })
    }
}

/// A specialized Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
