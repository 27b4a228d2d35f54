//! Subjects under test.
//!
//! A [`Subject`] is one entity the runner can probe: a server, a database, a
//! dataflow directory, an application backend, or a website. The set of
//! kinds is closed, so subjects are a sum type and the standard-tests table
//! is keyed by [`SubjectKind`].
//!
//! Subjects reference each other (a database lives on a server, a backend
//! uses a database and dataflows). Those references are shared read-only
//! handles; they are used by probes for connection details and by renderers
//! through [`Subject::links`], never by aggregation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::ports::probe::Probe;

/// Tag identifying the kind of a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    Server,
    Database,
    Dataflow,
    Backend,
    Website,
}

impl SubjectKind {
    /// All kinds, in display order.
    pub const ALL: [Self; 5] = [
        Self::Server,
        Self::Database,
        Self::Dataflow,
        Self::Backend,
        Self::Website,
    ];

    /// Type name used in flat export keys.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Server => "Server",
            Self::Database => "Database",
            Self::Dataflow => "Dataflow",
            Self::Backend => "Backend",
            Self::Website => "Website",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Server => "server",
            Self::Database => "database",
            Self::Dataflow => "dataflow",
            Self::Backend => "backend",
            Self::Website => "website",
        }
    }
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Fields shared by every kind of subject.
#[derive(Debug, Clone)]
pub struct SubjectInfo {
    /// Stable identifier, used as the key of exported results
    pub id: String,
    pub label: Option<String>,
    pub description: Option<String>,
    /// When false, this subject's status is left out of its parent's fold
    pub important: bool,
    /// Explicit probe list replacing the standard tests for this kind
    pub test_override: Vec<Probe>,
}

impl SubjectInfo {
    /// Important subject with no label and no override.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
            description: None,
            important: true,
            test_override: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub const fn with_important(mut self, important: bool) -> Self {
        self.important = important;
        self
    }

    #[must_use]
    pub fn with_tests(mut self, tests: Vec<Probe>) -> Self {
        self.test_override = tests;
        self
    }
}

/// A mounted directory expected on a server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mount {
    pub mountpoint: String,
    #[serde(default)]
    pub label: Option<String>,
    /// Missing optional mounts are reported but do not fail the probe
    #[serde(default = "default_true")]
    pub required: bool,
}

impl Mount {
    pub fn new(mountpoint: impl Into<String>) -> Self {
        Self {
            mountpoint: mountpoint.into(),
            label: None,
            required: true,
        }
    }
}

const fn default_true() -> bool {
    true
}

/// A single computer reachable over the network.
#[derive(Debug, Clone)]
pub struct Server {
    pub info: SubjectInfo,
    pub hostname: String,
    /// Users to try for ssh connections, first is preferred
    pub ssh_users: Vec<String>,
    pub mounts: Vec<Mount>,
}

impl Server {
    pub fn new(info: SubjectInfo, hostname: impl Into<String>) -> Self {
        Self {
            info,
            hostname: hostname.into(),
            ssh_users: Vec::new(),
            mounts: Vec::new(),
        }
    }

    /// Preferred ssh user, if any is configured.
    pub fn ssh_user(&self) -> Option<&str> {
        self.ssh_users.first().map(String::as_str)
    }
}

/// Supported database engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseEngine {
    #[default]
    Postgres,
}

/// A database instance hosted on a server.
#[derive(Debug, Clone)]
pub struct Database {
    pub info: SubjectInfo,
    pub engine: DatabaseEngine,
    pub host: Arc<Server>,
    pub database: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
}

/// A directory whose files are expected to keep changing.
#[derive(Debug, Clone)]
pub struct Dataflow {
    pub info: SubjectInfo,
    pub directory: String,
    /// Server to inspect the directory on; local filesystem when absent
    pub server: Option<Arc<Server>>,
    /// Glob filter on file names; all files when absent
    pub pattern: Option<String>,
    /// Newest matching file must be younger than this
    pub max_outage: Duration,
}

/// Expected job activity of a backend within a time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendJob {
    /// Look-back window
    #[serde(with = "duration_secs", rename = "period_secs", default = "default_period")]
    pub period: Duration,
    /// Restrict to these activity names; any activity when empty
    #[serde(default)]
    pub activity: Vec<String>,
    #[serde(default = "default_min_count")]
    pub min_count: i64,
    #[serde(default)]
    pub description: Option<String>,
}

const fn default_period() -> Duration {
    Duration::from_secs(3600)
}

const fn default_min_count() -> i64 {
    1
}

impl BackendJob {
    /// Text used as the message name for this job's count.
    pub fn message(&self) -> String {
        if let Some(d) = &self.description {
            return d.clone();
        }
        let jobs = if self.activity.is_empty() {
            "all".to_string()
        } else {
            self.activity.join(",")
        };
        format!("Jobs {jobs} in {}", natural_duration(self.period))
    }
}

/// Render a duration the way a person would say it: `1 hour`, `30 minutes`.
pub fn natural_duration(d: Duration) -> String {
    let secs = d.as_secs();
    let (n, unit) = if secs >= 86_400 && secs % 86_400 == 0 {
        (secs / 86_400, "day")
    } else if secs >= 3600 && secs % 3600 == 0 {
        (secs / 3600, "hour")
    } else if secs >= 60 && secs % 60 == 0 {
        (secs / 60, "minute")
    } else {
        (secs, "second")
    };
    if n == 1 {
        format!("1 {unit}")
    } else {
        format!("{n} {unit}s")
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

/// An application processing backend.
#[derive(Debug, Clone)]
pub struct Backend {
    pub info: SubjectInfo,
    pub database: Option<Arc<Database>>,
    pub server: Option<Arc<Server>>,
    pub dataflows: Vec<Arc<Dataflow>>,
    pub jobs: Vec<BackendJob>,
}

/// A URL served by a website.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebUrl {
    pub url: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub http_user: Option<String>,
    #[serde(default)]
    pub http_password: Option<String>,
    /// A failing optional URL is reported without failing the probe
    #[serde(default = "default_true")]
    pub required: bool,
}

impl WebUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            label: None,
            http_user: None,
            http_password: None,
            required: true,
        }
    }
}

/// A website served from a server.
#[derive(Debug, Clone)]
pub struct Website {
    pub info: SubjectInfo,
    pub server: Option<Arc<Server>>,
    pub database: Option<Arc<Database>>,
    pub urls: Vec<WebUrl>,
    pub http_user: Option<String>,
    pub http_password: Option<String>,
}

/// Any testable entity.
#[derive(Debug, Clone)]
pub enum Subject {
    Server(Arc<Server>),
    Database(Arc<Database>),
    Dataflow(Arc<Dataflow>),
    Backend(Arc<Backend>),
    Website(Arc<Website>),
}

impl Subject {
    pub fn kind(&self) -> SubjectKind {
        match self {
            Self::Server(_) => SubjectKind::Server,
            Self::Database(_) => SubjectKind::Database,
            Self::Dataflow(_) => SubjectKind::Dataflow,
            Self::Backend(_) => SubjectKind::Backend,
            Self::Website(_) => SubjectKind::Website,
        }
    }

    pub fn info(&self) -> &SubjectInfo {
        match self {
            Self::Server(s) => &s.info,
            Self::Database(s) => &s.info,
            Self::Dataflow(s) => &s.info,
            Self::Backend(s) => &s.info,
            Self::Website(s) => &s.info,
        }
    }

    pub fn id(&self) -> &str {
        &self.info().id
    }

    /// Display label, falling back to the id.
    pub fn label(&self) -> &str {
        let info = self.info();
        info.label.as_deref().unwrap_or(&info.id)
    }

    pub fn important(&self) -> bool {
        self.info().important
    }

    pub fn description(&self) -> Option<&str> {
        self.info().description.as_deref()
    }

    pub fn test_override(&self) -> &[Probe] {
        &self.info().test_override
    }

    /// Subjects this one depends on, for display only.
    pub fn links(&self) -> Vec<Self> {
        match self {
            Self::Server(_) => Vec::new(),
            Self::Database(db) => vec![Self::Server(db.host.clone())],
            Self::Dataflow(flow) => flow.server.iter().cloned().map(Self::Server).collect(),
            Self::Backend(backend) => {
                let mut links = Vec::new();
                if let Some(server) = &backend.server {
                    links.push(Self::Server(server.clone()));
                }
                links.extend(backend.dataflows.iter().cloned().map(Self::Dataflow));
                if let Some(db) = &backend.database {
                    links.push(Self::Database(db.clone()));
                }
                links
            }
            Self::Website(site) => {
                let mut links: Vec<Self> =
                    site.server.iter().cloned().map(Self::Server).collect();
                if let Some(db) = &site.database {
                    links.push(Self::Database(db.clone()));
                }
                links
            }
        }
    }

    pub fn as_server(&self) -> Option<&Server> {
        match self {
            Self::Server(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_database(&self) -> Option<&Database> {
        match self {
            Self::Database(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_dataflow(&self) -> Option<&Dataflow> {
        match self {
            Self::Dataflow(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_backend(&self) -> Option<&Backend> {
        match self {
            Self::Backend(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_website(&self) -> Option<&Website> {
        match self {
            Self::Website(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.label())
    }
}
