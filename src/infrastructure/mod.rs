//! Infrastructure layer module
//!
//! This module contains the adapters to the outside world:
//! - Configuration loading and system building (figment)
//! - Logging infrastructure (tracing-subscriber)
//! - Built-in probes (ssh, ping, PostgreSQL, HTTP, filesystem)
//!
//! Probe implementations satisfy the port trait defined in the domain layer.

pub mod config;
pub mod logging;
pub mod probes;
