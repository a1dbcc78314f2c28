// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain layer containing core types.
//!
//! This module holds the types every other layer speaks in: keys, values,
//! identities, layer kinds, update events, reconciliation diffs and errors. It
//! has no I/O.

pub mod config_key;
pub mod config_value;
pub mod diff;
pub mod errors;
pub mod identity;
pub mod layer;
pub mod paths;
pub mod service;
pub mod update;

// Re-export commonly used types
pub use config_key::ConfigKey;
pub use config_value::ConfigValue;
pub use diff::{exclude_nothing, Diff, ExclusionFilter};
pub use errors::{ConfigError, Result};
pub use identity::{AppIdentity, InstanceIdentity};
pub use layer::LayerKind;
pub use service::ConfigurationService;
pub use update::{UpdateEvent, UpdateKind};
