//! Domain errors for the cmon health-check runner.

use thiserror::Error;

use crate::domain::models::subject::SubjectKind;

/// Errors raised while building or validating the subject graph.
///
/// All of these are configuration errors: they are detected before any probe
/// runs and abort the run.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Probe '{probe}' is declared for {expected} subjects but bound to {kind} '{subject}'")]
    ProbeKindMismatch {
        probe: String,
        expected: SubjectKind,
        kind: SubjectKind,
        subject: String,
    },

    #[error("Unknown probe '{0}'")]
    UnknownProbe(String),

    #[error("Unknown {kind} '{id}' referenced by '{referrer}'")]
    UnknownSubject {
        kind: SubjectKind,
        id: String,
        referrer: String,
    },

    #[error("Duplicate subject id '{0}'")]
    DuplicateSubject(String),

    #[error("Test suite '{suite}' mixes {first} and {other} subjects")]
    MixedSuite {
        suite: String,
        first: SubjectKind,
        other: SubjectKind,
    },

    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

pub type DomainResult<T> = Result<T, DomainError>;
