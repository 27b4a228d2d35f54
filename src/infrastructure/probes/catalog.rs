//! Registry of probes available to configuration by name.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::subject::SubjectKind;
use crate::domain::ports::probe::Probe;

use super::backend::jobs_probe;
use super::database::login_probe;
use super::dataflow::outage_probe;
use super::server::{aliveness_probe, mounts_probe, ping_probe};
use super::shell::SshSessions;
use super::website::urls_probe;

/// Probes keyed by name.
#[derive(Debug, Clone, Default)]
pub struct ProbeCatalog {
    probes: BTreeMap<String, Probe>,
}

impl ProbeCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in probe, sharing one SSH session cache.
    pub fn builtin() -> Self {
        let ssh = Arc::new(SshSessions::new());
        let mut catalog = Self::new();
        for probe in [
            ping_probe(),
            aliveness_probe(Arc::clone(&ssh)),
            mounts_probe(Arc::clone(&ssh)),
            login_probe(),
            outage_probe(Arc::clone(&ssh)),
            jobs_probe(),
            urls_probe(),
        ] {
            catalog.register(probe);
        }
        catalog
    }

    /// Add a probe, replacing any existing probe of the same name.
    pub fn register(&mut self, probe: Probe) -> Option<Probe> {
        self.probes.insert(probe.name().to_string(), probe)
    }

    pub fn get(&self, name: &str) -> DomainResult<Probe> {
        self.probes
            .get(name)
            .cloned()
            .ok_or_else(|| DomainError::UnknownProbe(name.to_string()))
    }

    /// Resolve a list of probe names, failing on the first unknown one.
    pub fn resolve(&self, names: &[String]) -> DomainResult<Vec<Probe>> {
        names.iter().map(|n| self.get(n)).collect()
    }

    /// Probes of one subject kind, by name.
    pub fn for_kind(&self, kind: SubjectKind) -> Vec<&Probe> {
        self.probes
            .values()
            .filter(|p| p.subject_kind() == kind)
            .collect()
    }
}

/// Probe names run against each kind when the configuration names none.
pub const fn default_standard_tests(kind: SubjectKind) -> &'static [&'static str] {
    match kind {
        SubjectKind::Server => &["ping", "aliveness", "mounts"],
        SubjectKind::Database => &["login"],
        SubjectKind::Dataflow => &["outage"],
        SubjectKind::Backend => &["jobs"],
        SubjectKind::Website => &["urls"],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_covers_default_standard_tests() {
        let catalog = ProbeCatalog::builtin();
        for kind in SubjectKind::ALL {
            for name in default_standard_tests(kind) {
                let probe = catalog.get(name).unwrap();
                assert_eq!(probe.subject_kind(), kind, "{name}");
            }
        }
    }

    #[test]
    fn test_unknown_probe() {
        let err = ProbeCatalog::builtin().get("sysinfo").unwrap_err();
        assert!(matches!(err, DomainError::UnknownProbe(ref n) if n == "sysinfo"));
    }

    #[test]
    fn test_resolve_keeps_order() {
        let probes = ProbeCatalog::builtin()
            .resolve(&["mounts".into(), "ping".into()])
            .unwrap();
        let names: Vec<&str> = probes.iter().map(Probe::name).collect();
        assert_eq!(names, ["mounts", "ping"]);
    }

    #[test]
    fn test_for_kind() {
        let catalog = ProbeCatalog::builtin();
        assert_eq!(catalog.for_kind(SubjectKind::Server).len(), 3);
        assert_eq!(catalog.for_kind(SubjectKind::Website).len(), 1);
    }
}
