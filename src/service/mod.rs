// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service layer: composition, live remote layers and publication.
//!
//! [`ConfigurationBuilder`] assembles a [`LayeredConfig`] from the local file,
//! system sources, instance metadata, module defaults and the layers served by
//! a [`RemoteConfigProvider`](crate::ports::RemoteConfigProvider).
//! [`PathStoreConfigProvider`] maps an application onto a
//! [`PathStore`](crate::ports::PathStore) with [`RemoteConfigSource`] and
//! [`DynamicInstanceConfigSource`] for reading and [`ConfigWriter`] for
//! publishing.

pub mod active;
pub mod builder;
pub mod dynamic_source;
pub mod layered;
pub mod listeners;
pub mod loaders;
pub mod provider;
pub mod remote_source;
pub mod writer;

// Re-export commonly used types
pub use active::{active, install_active, reset_active};
pub use builder::{default_system_sources, ConfigurationBuilder, PUBLISH_DEFAULTS_KEY, VERSION_KEY};
pub use dynamic_source::DynamicInstanceConfigSource;
pub use layered::{ConfigHandle, Layer, LayeredConfig, LayeredConfigBuilder};
pub use listeners::{channel_listener, ListenerSet};
pub use loaders::{FileLayerLoader, LocalFileLayers, ModuleDefaultsLoader};
pub use provider::{exclude_runtime_keys, PathStoreConfigProvider};
pub use remote_source::RemoteConfigSource;
pub use writer::ConfigWriter;
