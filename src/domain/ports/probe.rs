//! Probe contract.
//!
//! A [`Probe`] pairs a metadata record ([`ProbeMeta`]) with the action that
//! performs the measurement ([`ProbeAction`]). The runner only ever consumes
//! the pair: metadata drives binding, filtering and self-documentation, the
//! action does the I/O.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::domain::models::context::RunContext;
use crate::domain::models::measurement::Measurement;
use crate::domain::models::message::MessageDescription;
use crate::domain::models::subject::{Subject, SubjectKind};

/// Declared metadata of a probe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeMeta {
    /// Short machine name, used in exported result keys
    pub name: String,
    /// Display label
    pub label: String,
    pub description: String,
    /// The only kind of subject this probe accepts
    pub subject_kind: SubjectKind,
    /// Schema of the messages this probe may emit
    pub messages: Vec<Arc<MessageDescription>>,
}

impl ProbeMeta {
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        description: impl Into<String>,
        subject_kind: SubjectKind,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            description: description.into(),
            subject_kind,
            messages: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_message(mut self, description: MessageDescription) -> Self {
        self.messages.push(Arc::new(description));
        self
    }

    /// Description declared for a message name.
    pub fn describe(&self, message_name: &str) -> Option<&Arc<MessageDescription>> {
        self.messages.iter().find(|d| d.name == message_name)
    }
}

/// The measuring half of a probe.
///
/// Implementations must not assume they are called with the subject kind
/// they were written for without checking; the runner validates kinds at
/// bind time, but a typed accessor such as [`Subject::as_server`] is the
/// idiomatic way to get at the fields.
///
/// Returning `Err` reports a connectivity or configuration problem and
/// produces an `Error` leaf. A condition that was observed and found wrong
/// should be reported as a `Failed` measurement instead.
#[async_trait]
pub trait ProbeAction: Send + Sync {
    async fn measure(&self, subject: &Subject, context: &RunContext)
        -> anyhow::Result<Measurement>;
}

/// A probe: metadata plus action.
#[derive(Clone)]
pub struct Probe {
    meta: Arc<ProbeMeta>,
    action: Arc<dyn ProbeAction>,
}

impl Probe {
    pub fn new(meta: ProbeMeta, action: Arc<dyn ProbeAction>) -> Self {
        Self {
            meta: Arc::new(meta),
            action,
        }
    }

    pub fn meta(&self) -> &Arc<ProbeMeta> {
        &self.meta
    }

    pub fn name(&self) -> &str {
        &self.meta.name
    }

    pub fn label(&self) -> &str {
        &self.meta.label
    }

    pub fn subject_kind(&self) -> SubjectKind {
        self.meta.subject_kind
    }

    pub fn accepts(&self, subject: &Subject) -> bool {
        self.meta.subject_kind == subject.kind()
    }

    pub fn action(&self) -> &Arc<dyn ProbeAction> {
        &self.action
    }
}

impl fmt::Debug for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Probe")
            .field("name", &self.meta.name)
            .field("subject_kind", &self.meta.subject_kind)
            .finish_non_exhaustive()
    }
}
