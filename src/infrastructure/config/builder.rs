//! Turns a loaded [`Config`] into a runnable [`System`].
//!
//! Subject references are resolved by id, probe names through the
//! [`ProbeCatalog`]. Every reference problem is reported here, before any
//! probe runs.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::domain::errors::DomainError;
use crate::domain::models::config::{Config, SubjectCommonConfig};
use crate::domain::models::subject::{
    Backend, Database, Dataflow, Server, Subject, SubjectInfo, SubjectKind, Website,
};
use crate::infrastructure::probes::{default_standard_tests, ProbeCatalog};
use crate::services::{Dashboard, Navigation, StandardTests, System, TestSuite};

use super::loader::ConfigError;

/// Subjects by id, one table per kind.
#[derive(Default)]
struct Registry {
    servers: HashMap<String, Arc<Server>>,
    databases: HashMap<String, Arc<Database>>,
    dataflows: HashMap<String, Arc<Dataflow>>,
    backends: HashMap<String, Arc<Backend>>,
    websites: HashMap<String, Arc<Website>>,
}

fn unknown(kind: SubjectKind, id: &str, referrer: &str) -> DomainError {
    DomainError::UnknownSubject {
        kind,
        id: id.to_string(),
        referrer: referrer.to_string(),
    }
}

fn lookup<T>(
    table: &HashMap<String, Arc<T>>,
    kind: SubjectKind,
    id: &str,
    referrer: &str,
) -> Result<Arc<T>, DomainError> {
    table
        .get(id)
        .cloned()
        .ok_or_else(|| unknown(kind, id, referrer))
}

fn lookup_opt<T>(
    table: &HashMap<String, Arc<T>>,
    kind: SubjectKind,
    id: Option<&String>,
    referrer: &str,
) -> Result<Option<Arc<T>>, DomainError> {
    id.map(|id| lookup(table, kind, id, referrer)).transpose()
}

fn insert<T>(table: &mut HashMap<String, Arc<T>>, id: &str, value: T) -> Result<(), DomainError> {
    if table.insert(id.to_string(), Arc::new(value)).is_some() {
        return Err(DomainError::DuplicateSubject(id.to_string()));
    }
    Ok(())
}

fn subject_info(common: &SubjectCommonConfig, catalog: &ProbeCatalog) -> Result<SubjectInfo, DomainError> {
    let mut info = SubjectInfo::new(&common.id)
        .with_important(common.important)
        .with_tests(catalog.resolve(&common.tests)?);
    info.label.clone_from(&common.label);
    info.description.clone_from(&common.description);
    Ok(info)
}

impl Registry {
    fn build(config: &Config, catalog: &ProbeCatalog) -> Result<Self, DomainError> {
        let mut registry = Self::default();

        for c in &config.servers {
            let mut server = Server::new(subject_info(&c.common, catalog)?, &c.hostname);
            server.ssh_users.clone_from(&c.ssh_users);
            server.mounts.clone_from(&c.mounts);
            insert(&mut registry.servers, &c.common.id, server)?;
        }

        for c in &config.databases {
            let database = Database {
                info: subject_info(&c.common, catalog)?,
                engine: c.engine,
                host: lookup(&registry.servers, SubjectKind::Server, &c.host, &c.common.id)?,
                database: c.database.clone(),
                port: c.port,
                user: c.user.clone(),
                password: c.password.clone(),
            };
            insert(&mut registry.databases, &c.common.id, database)?;
        }

        for c in &config.dataflows {
            if let Some(pattern) = &c.pattern {
                glob::Pattern::new(pattern).map_err(|e| DomainError::InvalidPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })?;
            }
            let dataflow = Dataflow {
                info: subject_info(&c.common, catalog)?,
                directory: c.directory.clone(),
                server: lookup_opt(&registry.servers, SubjectKind::Server, c.server.as_ref(), &c.common.id)?,
                pattern: c.pattern.clone(),
                max_outage: Duration::from_secs(c.max_outage_secs),
            };
            insert(&mut registry.dataflows, &c.common.id, dataflow)?;
        }

        for c in &config.backends {
            let id = &c.common.id;
            let backend = Backend {
                info: subject_info(&c.common, catalog)?,
                database: lookup_opt(&registry.databases, SubjectKind::Database, c.database.as_ref(), id)?,
                server: lookup_opt(&registry.servers, SubjectKind::Server, c.server.as_ref(), id)?,
                dataflows: c
                    .dataflows
                    .iter()
                    .map(|d| lookup(&registry.dataflows, SubjectKind::Dataflow, d, id))
                    .collect::<Result<_, _>>()?,
                jobs: c.jobs.clone(),
            };
            insert(&mut registry.backends, id, backend)?;
        }

        for c in &config.websites {
            let id = &c.common.id;
            let website = Website {
                info: subject_info(&c.common, catalog)?,
                server: lookup_opt(&registry.servers, SubjectKind::Server, c.server.as_ref(), id)?,
                database: lookup_opt(&registry.databases, SubjectKind::Database, c.database.as_ref(), id)?,
                urls: c.urls.clone(),
                http_user: c.http_user.clone(),
                http_password: c.http_password.clone(),
            };
            insert(&mut registry.websites, id, website)?;
        }

        Ok(registry)
    }

    fn subject(&self, kind: SubjectKind, id: &str, referrer: &str) -> Result<Subject, DomainError> {
        Ok(match kind {
            SubjectKind::Server => Subject::Server(lookup(&self.servers, kind, id, referrer)?),
            SubjectKind::Database => Subject::Database(lookup(&self.databases, kind, id, referrer)?),
            SubjectKind::Dataflow => Subject::Dataflow(lookup(&self.dataflows, kind, id, referrer)?),
            SubjectKind::Backend => Subject::Backend(lookup(&self.backends, kind, id, referrer)?),
            SubjectKind::Website => Subject::Website(lookup(&self.websites, kind, id, referrer)?),
        })
    }
}

/// Standard tests per kind: configured names, else the built-in defaults.
pub fn standard_tests(config: &Config, catalog: &ProbeCatalog) -> Result<StandardTests, ConfigError> {
    let mut table = StandardTests::new();
    for kind in SubjectKind::ALL {
        let probes = match config.standard_tests.get(&kind) {
            Some(names) => catalog.resolve(names)?,
            None => default_standard_tests(kind)
                .iter()
                .map(|name| catalog.get(name))
                .collect::<Result<_, _>>()?,
        };
        table.set(kind, probes)?;
    }
    Ok(table)
}

/// Build and validate the system described by `config`.
pub fn build_system(config: &Config, catalog: &ProbeCatalog) -> Result<System, ConfigError> {
    let standard = standard_tests(config, catalog)?;
    let registry = Registry::build(config, catalog)?;

    let mut dashboards = Vec::with_capacity(config.dashboards.len());
    for d in &config.dashboards {
        let mut suites = Vec::with_capacity(d.test_suites.len());
        for s in &d.test_suites {
            let subjects = s
                .subjects
                .iter()
                .map(|id| registry.subject(s.kind, id, &s.name))
                .collect::<Result<Vec<_>, _>>()?;
            suites.push(TestSuite::new(&s.name, s.label.clone(), s.kind, subjects)?);
        }
        debug!(dashboard = %d.name, suites = suites.len(), "Dashboard configured");
        dashboards.push(Dashboard::new(&d.name, d.label.clone(), suites));
    }

    let navigation = config.navigation.as_ref().map(|n| Navigation {
        title: n.title.clone(),
        url: n.url.clone(),
        tooltip: n.tooltip.clone(),
    });

    Ok(System::new(navigation, standard, dashboards)?)
}
