use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::errors::DomainError;
use crate::domain::models::config::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid probe_timeout_secs: {0}. Must be at least 1")]
    InvalidProbeTimeout(u64),

    #[error("Invalid max_concurrency: {0}. Must be at least 1")]
    InvalidMaxConcurrency(usize),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from `path` with environment overrides
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. The YAML file at `path`
    /// 3. Environment variables (CMON_* prefix, `__` separates nesting)
    pub fn load(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed("CMON_").ignore(&["config"]).split("__"))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, without environment overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate the ambient settings after loading
    ///
    /// The subject graph is checked separately by
    /// [`build_system`](super::build_system), which needs the probe catalog.
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        if config.run.probe_timeout_secs == 0 {
            return Err(ConfigError::InvalidProbeTimeout(config.run.probe_timeout_secs));
        }

        if config.run.max_concurrency == 0 {
            return Err(ConfigError::InvalidMaxConcurrency(config.run.max_concurrency));
        }

        for dashboard in &config.dashboards {
            if dashboard.name.is_empty() {
                return Err(ConfigError::ValidationFailed(
                    "Dashboard name cannot be empty".to_string(),
                ));
            }
            for suite in &dashboard.test_suites {
                if suite.name.is_empty() {
                    return Err(ConfigError::ValidationFailed(format!(
                        "Test suite name cannot be empty in dashboard '{}'",
                        dashboard.name
                    )));
                }
            }
        }

        Ok(())
    }
}
