//! cmon - configuration-driven health-check runner
//!
//! cmon probes a declared set of subjects (servers, databases, dataflow
//! directories, application backends and websites), folds the probe results
//! into a traffic-light tree, and renders that tree for terminals, scripts
//! or JSON consumers.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): result model, subjects, probe contract
//! - **Service Layer** (`services`): binding, filtering, execution and folding
//! - **Infrastructure Layer** (`infrastructure`): config, logging, built-in probes
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use cmon::{build_system, ConfigLoader, ProbeCatalog, RunContext};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::load("cmon.yaml")?;
//!     let system = build_system(&config, &ProbeCatalog::builtin())?;
//!     let result = system.run(&RunContext::new()).await;
//!     println!("{}", result.status);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    Config, Measurement, MeasurementSubject, Message, RunContext, Status, Subject, SubjectKind,
};
pub use domain::ports::{Probe, ProbeAction, ProbeMeta};
pub use domain::{DomainError, DomainResult};
pub use infrastructure::config::{build_system, ConfigError, ConfigLoader};
pub use infrastructure::probes::ProbeCatalog;
pub use services::{Dashboard, StandardTests, System, TestSuite};
