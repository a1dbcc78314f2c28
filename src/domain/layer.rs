// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layer kinds and their fixed precedence.
//!
//! Every layer in a [`LayeredConfig`](crate::service::LayeredConfig) is tagged
//! with a `LayerKind`. Composition orders layers by [`LayerKind::rank`], highest
//! first, which yields both precedence contracts:
//!
//! - with a remote provider: system > version override > instance metadata >
//!   remote instance > remote base > local file
//! - without one: system > version override > instance metadata > local file >
//!   module defaults

use std::fmt;

/// The role a layer plays in the precedence stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerKind {
    /// Command-line system properties and environment variables.
    SystemEnv,
    /// The resolved application version.
    VersionOverride,
    /// Instance identity (id, region, zone, addresses).
    InstanceMetadata,
    /// The instance-specific remote sub-tree.
    RemoteInstance,
    /// The shared remote `config` sub-tree.
    RemoteBase,
    /// The environment-specific sibling of the local file.
    LocalFileEnvOverride,
    /// The local configuration file.
    LocalFile,
    /// Merged module default contributions.
    ModuleDefaults,
}

impl LayerKind {
    /// Precedence rank; higher ranks win.
    pub fn rank(self) -> u8 {
        match self {
            LayerKind::SystemEnv => 8,
            LayerKind::VersionOverride => 7,
            LayerKind::InstanceMetadata => 6,
            LayerKind::RemoteInstance => 5,
            LayerKind::RemoteBase => 4,
            LayerKind::LocalFileEnvOverride => 3,
            LayerKind::LocalFile => 2,
            LayerKind::ModuleDefaults => 1,
        }
    }

    /// Short stable label used in layer names and logs.
    pub fn label(self) -> &'static str {
        match self {
            LayerKind::SystemEnv => "system",
            LayerKind::VersionOverride => "version-override",
            LayerKind::InstanceMetadata => "instance-metadata",
            LayerKind::RemoteInstance => "remote-instance",
            LayerKind::RemoteBase => "remote-base",
            LayerKind::LocalFileEnvOverride => "local-file-env",
            LayerKind::LocalFile => "local-file",
            LayerKind::ModuleDefaults => "module-defaults",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
