//! Configuration management infrastructure
//!
//! Hierarchical configuration using figment:
//! - YAML file loading
//! - Environment variable overrides
//! - Configuration validation
//! - Resolution of the subject graph into a runnable system

pub mod builder;
pub mod loader;

pub use builder::{build_system, standard_tests};
pub use loader::{ConfigError, ConfigLoader};
