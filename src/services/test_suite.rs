//! Test suites: a named group of subjects of one kind.
//!
//! Running a suite runs every included subject's resolved probes and folds
//! the leaves into one measurement per subject, then folds the subjects into
//! the suite measurement. Subjects run concurrently up to
//! `context.max_concurrency`; probes of one subject run in order so their
//! messages keep emission order.

use futures::stream::{self, StreamExt};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::context::RunContext;
use crate::domain::models::measurement::{Measurement, MeasurementSubject};
use crate::domain::models::status::Status;
use crate::domain::models::subject::{Subject, SubjectKind};
use crate::domain::ports::probe::Probe;

use super::binding::{resolve_probes, validate_binding, StandardTests};
use super::executor::run_probe;
use super::filter::{probe_included, subject_included};

/// A named set of subjects sharing one kind.
#[derive(Debug, Clone)]
pub struct TestSuite {
    name: String,
    label: Option<String>,
    kind: SubjectKind,
    subjects: Vec<Subject>,
}

impl TestSuite {
    /// Create a suite, rejecting subjects of any other kind.
    pub fn new(
        name: impl Into<String>,
        label: Option<String>,
        kind: SubjectKind,
        subjects: Vec<Subject>,
    ) -> DomainResult<Self> {
        let name = name.into();
        if let Some(other) = subjects.iter().find(|s| s.kind() != kind) {
            return Err(DomainError::MixedSuite {
                suite: name,
                first: kind,
                other: other.kind(),
            });
        }
        Ok(Self {
            name,
            label,
            kind,
            subjects,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn kind(&self) -> SubjectKind {
        self.kind
    }

    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    /// Check every subject's probe binding.
    pub fn validate(&self, standard: &StandardTests) -> DomainResult<()> {
        self.subjects
            .iter()
            .try_for_each(|s| validate_binding(s, standard))
    }

    /// Run the suite and return its measurement.
    ///
    /// A suite with no included subjects is `NotApplicable` and has no
    /// children.
    pub async fn run(&self, standard: &StandardTests, context: &RunContext) -> Measurement {
        let included: Vec<&Subject> = self
            .subjects
            .iter()
            .filter(|s| subject_included(s, context))
            .collect();

        tracing::info!(
            suite = %self.name,
            subjects = self.subjects.len(),
            included = included.len(),
            action = if included.is_empty() { "skip" } else { "run" },
            "Test suite"
        );

        let mut result = Measurement::parent(MeasurementSubject::TestSuite {
            name: self.name.clone(),
            label: self.label.clone(),
        });

        let measured: Vec<Option<Measurement>> = stream::iter(included)
            .map(|subject| run_subject(subject, standard, context))
            .buffered(context.max_concurrency.max(1))
            .collect()
            .await;

        for m in measured.into_iter().flatten() {
            result.add_child(m);
        }
        result.fold_children();
        result
    }
}

/// Run all applicable probes against one subject.
///
/// Returns `None` when the test filter removed every probe, so the subject
/// does not appear in the result. A subject with no probes bound, or whose
/// probes all reported `NotApplicable`, is kept as a `NotApplicable` node so
/// configuration gaps stay visible.
pub async fn run_subject(
    subject: &Subject,
    standard: &StandardTests,
    context: &RunContext,
) -> Option<Measurement> {
    let mut result = Measurement::parent(MeasurementSubject::testable(subject))
        .with_important(subject.important());

    let probes = resolve_probes(subject, standard);
    if probes.is_empty() {
        tracing::info!(subject = subject.id(), "No probes bound to subject");
        result.status = Status::NotApplicable;
        return Some(result);
    }

    let selected: Vec<&Probe> = probes
        .iter()
        .filter(|p| probe_included(p, context))
        .collect();
    if selected.is_empty() {
        tracing::debug!(subject = subject.id(), "All probes excluded by test filter");
        return None;
    }

    tracing::info!(subject = subject.id(), probes = selected.len(), "Subject");
    for probe in selected {
        let leaf = run_probe(probe, subject, context).await;
        if leaf.status == Status::NotApplicable {
            continue;
        }
        result.add_child(leaf);
    }
    result.fold_children();
    Some(result)
}
