//! Run-wide inclusion filters.

use crate::domain::models::context::RunContext;
use crate::domain::models::subject::Subject;
use crate::domain::ports::probe::Probe;

/// Whether `subject` takes part in this run.
///
/// With no subject filter every subject is included. Otherwise the
/// lower-cased subject id must glob-match at least one pattern.
pub fn subject_included(subject: &Subject, context: &RunContext) -> bool {
    context
        .include_subjects
        .as_ref()
        .is_none_or(|set| set.matches(&subject.id().to_lowercase()))
}

/// Whether `probe` runs in this run.
///
/// With no test filter every probe runs. Otherwise the probe's name or label
/// must match a pattern.
pub fn probe_included(probe: &Probe, context: &RunContext) -> bool {
    context
        .include_tests
        .as_ref()
        .is_none_or(|set| set.matches(probe.name()) || set.matches(probe.label()))
}
