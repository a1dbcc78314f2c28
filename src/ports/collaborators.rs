// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ports for collaborators that feed the builder: instance identity and module
//! default-property resources.

use crate::domain::{InstanceIdentity, Result};
use std::path::PathBuf;

/// Supplies the identity of the running instance.
pub trait InstanceIdentityProvider: Send + Sync {
    /// Returns the current instance identity.
    fn instance_identity(&self) -> Result<InstanceIdentity>;
}

/// Where a module's default properties come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResourceContent {
    /// A file on disk, read at load time.
    File(PathBuf),
    /// Text compiled into the binary, typically via `include_str!`.
    Embedded(&'static str),
}

/// One module's declared default-property resource.
///
/// The name selects the parser by extension and identifies the resource in
/// duplicate-key errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleResource {
    /// Resource name, e.g. `db-module.properties`.
    pub name: String,
    /// Where the content comes from.
    pub content: ResourceContent,
}

impl ModuleResource {
    /// A resource backed by a file; the file path doubles as its name.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: path.display().to_string(),
            content: ResourceContent::File(path),
        }
    }

    /// A resource compiled into the binary.
    pub fn embedded(name: impl Into<String>, content: &'static str) -> Self {
        Self {
            name: name.into(),
            content: ResourceContent::Embedded(content),
        }
    }
}

/// Lists the default-property resources declared by the application's modules.
pub trait ModuleScanner: Send + Sync {
    /// Returns every declared resource, in declaration order.
    fn default_resources(&self) -> Result<Vec<ModuleResource>>;
}
