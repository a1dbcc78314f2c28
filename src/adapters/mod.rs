// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapters layer containing concrete implementations of the ports.
//!
//! Configuration sources (files, environment, command line, in-memory maps),
//! file format parsers, path stores (in-memory and etcd), and the default
//! collaborators consumed by the builder.

#[cfg(feature = "cli")]
pub mod cli;
#[cfg(feature = "env")]
pub mod env_var;
#[cfg(feature = "etcd")]
pub mod etcd;
pub mod file;
pub mod instance;
pub mod map_source;
pub mod memory_store;
pub mod modules;
pub mod properties;
pub mod retry;
#[cfg(feature = "yaml")]
pub mod yaml;

// Re-export adapters based on feature flags
#[cfg(feature = "cli")]
pub use cli::CommandLineAdapter;
#[cfg(feature = "env")]
pub use env_var::EnvVarAdapter;
#[cfg(feature = "etcd")]
pub use etcd::EtcdPathStore;
pub use file::FileAdapter;
pub use instance::DefaultInstanceIdentity;
pub use map_source::MapSource;
pub use memory_store::MemoryPathStore;
pub use modules::StaticModuleRegistry;
pub use properties::PropertiesParser;
pub use retry::RetryPolicy;
#[cfg(feature = "yaml")]
pub use yaml::YamlParser;
