//! Logging infrastructure
//!
//! Structured logging using tracing and tracing-subscriber:
//! - JSON or human-readable formatting
//! - `RUST_LOG` filtering on top of the configured level
//! - Output on stderr, leaving stdout to run results

pub mod logger;

pub use logger::LoggerImpl;
