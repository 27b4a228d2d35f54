//! Command handlers
//!
//! Thin adapters between clap arguments and the services layer.

pub mod run;
pub mod show_config;
pub mod show_subjects;
