//! Domain layer for the cmon health-check runner
//!
//! This module contains the result model, the subject registry, the probe
//! contract and the run context. It performs no I/O.

pub mod errors;
pub mod models;
pub mod ports;

// Re-export error types for convenient access
pub use errors::{DomainError, DomainResult};
