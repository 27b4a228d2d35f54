use std::io;

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::domain::models::config::LoggingConfig;

/// Logger implementation using tracing
///
/// Logs always go to stderr so stdout carries only run results.
pub struct LoggerImpl;

impl LoggerImpl {
    /// Initialize the global subscriber
    ///
    /// `verbose` raises the configured level to at least `debug`. `RUST_LOG`
    /// still overrides both.
    ///
    /// # Errors
    /// Returns an error if the level or format is invalid, or a global
    /// subscriber is already installed
    pub fn init(config: &LoggingConfig, verbose: bool) -> Result<Self> {
        let level = effective_level(parse_log_level(&config.level)?, verbose);

        let env_filter = EnvFilter::builder()
            .with_default_directive(level.into())
            .from_env_lossy();

        let layer = match config.format.as_str() {
            "json" => tracing_subscriber::fmt::layer()
                .json()
                .with_writer(io::stderr)
                .with_current_span(true)
                .with_target(true)
                .with_filter(env_filter)
                .boxed(),
            "pretty" => tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(true)
                .with_filter(env_filter)
                .boxed(),
            other => anyhow::bail!("Invalid log format: {other}"),
        };

        tracing_subscriber::registry().with(layer).try_init()?;

        tracing::debug!(level = %level, format = %config.format, "logger initialized");
        Ok(Self)
    }
}

/// Parse log level string to Level
fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!("Invalid log level: {level}"),
    }
}

/// `Level` orders more verbose levels higher.
fn effective_level(level: Level, verbose: bool) -> Level {
    if verbose && level < Level::DEBUG {
        Level::DEBUG
    } else {
        level
    }
}
