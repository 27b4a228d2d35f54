use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::subject::{BackendJob, DatabaseEngine, Mount, SubjectKind, WebUrl};

/// Main configuration structure for cmon
///
/// Describes the ambient settings (logging, execution limits) and the full
/// subject graph: subjects of each kind, the standard tests per kind, and
/// the dashboards that group subjects into test suites.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Probe execution limits
    #[serde(default)]
    pub run: RunConfig,

    /// First item of the dashboard navigation bar
    #[serde(default)]
    pub navigation: Option<NavigationConfig>,

    /// Probe names applied to each subject kind when a subject has no
    /// `tests` override. Kinds left out use the built-in defaults.
    #[serde(default)]
    pub standard_tests: BTreeMap<SubjectKind, Vec<String>>,

    #[serde(default)]
    pub servers: Vec<ServerConfig>,

    #[serde(default)]
    pub databases: Vec<DatabaseConfig>,

    #[serde(default)]
    pub dataflows: Vec<DataflowConfig>,

    #[serde(default)]
    pub backends: Vec<BackendConfig>,

    #[serde(default)]
    pub websites: Vec<WebsiteConfig>,

    #[serde(default)]
    pub dashboards: Vec<DashboardConfig>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Probe execution limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RunConfig {
    /// Seconds before a single probe call is abandoned
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,

    /// Subjects probed concurrently within one test suite
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

const fn default_probe_timeout_secs() -> u64 {
    30
}

const fn default_max_concurrency() -> usize {
    8
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            probe_timeout_secs: default_probe_timeout_secs(),
            max_concurrency: default_max_concurrency(),
        }
    }
}

/// Navigation link shown on dashboards
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationConfig {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub tooltip: Option<String>,
}

/// Fields every subject section shares
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectCommonConfig {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub important: bool,
    /// Probe names replacing the standard tests for this subject
    #[serde(default)]
    pub tests: Vec<String>,
}

const fn default_true() -> bool {
    true
}

/// A server entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(flatten)]
    pub common: SubjectCommonConfig,
    pub hostname: String,
    #[serde(default)]
    pub ssh_users: Vec<String>,
    #[serde(default)]
    pub mounts: Vec<Mount>,
}

/// A database entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(flatten)]
    pub common: SubjectCommonConfig,
    #[serde(default)]
    pub engine: DatabaseEngine,
    /// Id of the server hosting the database
    pub host: String,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// A dataflow entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataflowConfig {
    #[serde(flatten)]
    pub common: SubjectCommonConfig,
    pub directory: String,
    /// Id of the server holding the directory; local when absent
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default = "default_max_outage_secs")]
    pub max_outage_secs: u64,
}

const fn default_max_outage_secs() -> u64 {
    86_400
}

/// A backend entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(flatten)]
    pub common: SubjectCommonConfig,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default)]
    pub dataflows: Vec<String>,
    #[serde(default)]
    pub jobs: Vec<BackendJob>,
}

/// A website entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebsiteConfig {
    #[serde(flatten)]
    pub common: SubjectCommonConfig,
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub urls: Vec<WebUrl>,
    #[serde(default)]
    pub http_user: Option<String>,
    #[serde(default)]
    pub http_password: Option<String>,
}

/// A dashboard entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub test_suites: Vec<TestSuiteConfig>,
}

/// A test suite entry: subjects of one kind, by id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteConfig {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    pub kind: SubjectKind,
    #[serde(default)]
    pub subjects: Vec<String>,
}
