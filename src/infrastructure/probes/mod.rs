//! Built-in probes
//!
//! Each probe pairs a [`ProbeMeta`](crate::domain::ports::ProbeMeta) with a
//! [`ProbeAction`](crate::domain::ports::ProbeAction) that talks to the real
//! system: `ping` and `ssh` subprocesses, PostgreSQL through sqlx, HTTP
//! through reqwest. Every action returns `Good` without touching anything
//! when the run is simulated.

pub mod backend;
pub mod catalog;
pub mod database;
pub mod dataflow;
pub mod df;
pub mod server;
pub mod shell;
pub mod website;

pub use catalog::{default_standard_tests, ProbeCatalog};
pub use shell::SshSessions;
