// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered runtime configuration backed by a hierarchical coordination service.
//!
//! An application's configuration is resolved from an ordered stack of layers
//! with fixed precedence. Remote layers live in a path store (etcd, or the
//! in-process store used by tests) and update in place when the store changes.
//! The same layout can be published to, with diff-based reconciliation.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain Layer**: keys, values, identities, layer kinds, update events,
//!   diffs and errors
//! - **Ports**: the traits the core consumes (`ConfigSource`, `PathStore`,
//!   `RemoteConfigProvider`, `InstanceIdentityProvider`, `ModuleScanner`)
//! - **Adapters**: files, environment, command line, in-memory and etcd path
//!   stores, retry policy
//! - **Service**: the builder, the layered configuration, the live remote
//!   layers and the writer
//!
//! # Remote layout
//!
//! ```text
//! /{environment}/{name}/{version}/config               shared layer, one child per key
//! /{environment}/{name}/{version}/{instance_id}-config instance override layer
//! ```
//!
//! # Feature Flags
//!
//! - `yaml`: YAML local files (default)
//! - `env`: environment variables in the system layer (default)
//! - `cli`: `-Dkey=value` command-line overrides in the system layer (default)
//! - `etcd`: the etcd path store and the `layercfg-publish` binary
//! - `full`: all of the above
//!
//! # Quick Start
//!
//! ```rust
//! use layercfg::prelude::*;
//! use std::sync::Arc;
//!
//! # fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryPathStore::new());
//! let provider = Arc::new(PathStoreConfigProvider::new(store.clone()));
//!
//! let app = AppIdentity::new("testapp", "unittest", "1.0.0")?;
//! let published: std::collections::BTreeMap<_, _> = [("db.host".to_string(), "db1".to_string())].into_iter().collect();
//! provider.write(&app, &published, false)?;
//!
//! let config = ConfigurationBuilder::new("testapp", "unittest")
//!     .add_system_configs(false)
//!     .version("1.0.0")
//!     .remote_provider(provider)
//!     .build()?;
//!
//! assert_eq!(config.get_string("db.host")?, "db1");
//!
//! store.set_data("/unittest/testapp/1.0.0/config/db.host", "db2")?;
//! assert_eq!(config.get_string("db.host")?, "db2");
//! # config.close()?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

/// Commonly used types and traits.
///
/// This module re-exports the most commonly used types and traits for convenient access.
pub mod prelude {
    pub use crate::adapters::{MapSource, MemoryPathStore};
    pub use crate::domain::{
        AppIdentity, ConfigError, ConfigKey, ConfigValue, ConfigurationService, Result,
        UpdateEvent,
    };
    pub use crate::ports::{
        ConfigParser, ConfigSource, PathStore, RemoteConfigProvider, UpdateListener, UpdateSource,
    };
    pub use crate::service::{
        channel_listener, ConfigHandle, ConfigWriter, ConfigurationBuilder,
        DynamicInstanceConfigSource, LayeredConfig, PathStoreConfigProvider, RemoteConfigSource,
    };

    // Re-export adapters based on feature flags
    #[cfg(feature = "cli")]
    pub use crate::adapters::CommandLineAdapter;
    #[cfg(feature = "env")]
    pub use crate::adapters::EnvVarAdapter;
    #[cfg(feature = "etcd")]
    pub use crate::adapters::EtcdPathStore;
    #[cfg(feature = "yaml")]
    pub use crate::adapters::YamlParser;
}
