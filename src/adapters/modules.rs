// SPDX-License-Identifier: MIT OR Apache-2.0

//! Explicit registry of module default-property resources.

use crate::domain::Result;
use crate::ports::{ModuleResource, ModuleScanner};
use std::path::PathBuf;

/// A [`ModuleScanner`] backed by an explicit registration list.
///
/// Each module of the application registers the resource holding its default
/// properties, either a file or text embedded with `include_str!`.
///
/// # Examples
///
/// ```rust
/// use layercfg::adapters::StaticModuleRegistry;
/// use layercfg::ports::ModuleScanner;
///
/// let registry = StaticModuleRegistry::new()
///     .register_embedded("db-module.properties", "db.pool.size=10\n")
///     .register_embedded("http-module.properties", "http.port=8080\n");
///
/// assert_eq!(registry.default_resources().unwrap().len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticModuleRegistry {
    resources: Vec<ModuleResource>,
}

impl StaticModuleRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a resource.
    pub fn register(mut self, resource: ModuleResource) -> Self {
        self.resources.push(resource);
        self
    }

    /// Registers a properties or YAML file.
    pub fn register_file(self, path: impl Into<PathBuf>) -> Self {
        self.register(ModuleResource::file(path))
    }

    /// Registers text compiled into the binary. `name` selects the parser.
    pub fn register_embedded(self, name: impl Into<String>, content: &'static str) -> Self {
        self.register(ModuleResource::embedded(name, content))
    }
}

impl ModuleScanner for StaticModuleRegistry {
    fn default_resources(&self) -> Result<Vec<ModuleResource>> {
        Ok(self.resources.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::ResourceContent;

    #[test]
    fn test_registration_order_is_kept() {
        let registry = StaticModuleRegistry::new()
            .register_file("/opt/app/a.properties")
            .register_embedded("b.properties", "b=1");

        let resources = registry.default_resources().unwrap();
        assert_eq!(resources[0].name, "/opt/app/a.properties");
        assert!(matches!(resources[0].content, ResourceContent::File(_)));
        assert_eq!(resources[1].content, ResourceContent::Embedded("b=1"));
    }
}
