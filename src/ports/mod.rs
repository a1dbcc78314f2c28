// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ports layer containing trait definitions.
//!
//! This module contains the trait definitions (ports) that define the interfaces
//! between the configuration core and its collaborators. These traits are
//! implemented by adapters in the adapters layer and by the live sources in the
//! service layer.

pub mod collaborators;
pub mod listener;
pub mod parser;
pub mod path_store;
pub mod remote;
pub mod source;

// Re-export commonly used types
pub use collaborators::{InstanceIdentityProvider, ModuleResource, ModuleScanner, ResourceContent};
pub use listener::{ListenerId, UpdateListener, UpdateSource};
pub use parser::ConfigParser;
pub use path_store::{ChildCallback, ChildEvent, ChildEventKind, PathStore, WatchHandle};
pub use remote::{RemoteConfigProvider, RemoteLayers};
pub use source::ConfigSource;
