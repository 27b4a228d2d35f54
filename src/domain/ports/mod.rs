//! Port trait definitions (Hexagonal Architecture)
//!
//! The probe contract is the only seam between the engine and the systems
//! it measures: infrastructure provides [`ProbeAction`] implementations and
//! the services layer consumes [`Probe`]s.

pub mod probe;

pub use probe::{Probe, ProbeAction, ProbeMeta};
