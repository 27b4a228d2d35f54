//! Subject-to-probe binding.
//!
//! [`StandardTests`] is the table of probes applied to every subject of a
//! kind. A subject with a non-empty override list uses that list instead.
//! Binding is validated once, before any probe runs: a probe declared for
//! one kind of subject can never be handed another.

use std::collections::HashMap;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::subject::{Subject, SubjectKind};
use crate::domain::ports::probe::Probe;

/// Probes applied to each subject kind by default.
#[derive(Debug, Clone, Default)]
pub struct StandardTests {
    table: HashMap<SubjectKind, Vec<Probe>>,
}

impl StandardTests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the probes for one kind, validating that every probe accepts it.
    pub fn set(&mut self, kind: SubjectKind, probes: Vec<Probe>) -> DomainResult<()> {
        if let Some(bad) = probes.iter().find(|p| p.subject_kind() != kind) {
            return Err(DomainError::ProbeKindMismatch {
                probe: bad.name().to_string(),
                expected: bad.subject_kind(),
                kind,
                subject: format!("standard tests for {kind}"),
            });
        }
        self.table.insert(kind, probes);
        Ok(())
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, kind: SubjectKind, probes: Vec<Probe>) -> DomainResult<Self> {
        self.set(kind, probes)?;
        Ok(self)
    }

    pub fn get(&self, kind: SubjectKind) -> &[Probe] {
        self.table.get(&kind).map_or(&[], Vec::as_slice)
    }
}

/// Probes to run against `subject`, in configured order.
///
/// The subject's override list wins when non-empty; otherwise the standard
/// tests for its kind apply. An empty result means the subject has nothing
/// applicable.
pub fn resolve_probes<'a>(subject: &'a Subject, standard: &'a StandardTests) -> &'a [Probe] {
    let overrides = subject.test_override();
    if overrides.is_empty() {
        standard.get(subject.kind())
    } else {
        overrides
    }
}

/// Check that every probe resolved for `subject` accepts its kind.
pub fn validate_binding(subject: &Subject, standard: &StandardTests) -> DomainResult<()> {
    for probe in resolve_probes(subject, standard) {
        if !probe.accepts(subject) {
            return Err(DomainError::ProbeKindMismatch {
                probe: probe.name().to_string(),
                expected: probe.subject_kind(),
                kind: subject.kind(),
                subject: subject.id().to_string(),
            });
        }
    }
    Ok(())
}
