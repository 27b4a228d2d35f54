//! Measurement result tree.
//!
//! Every level of a run produces a [`Measurement`]: probes produce leaves,
//! and subjects, test suites, dashboards and the system produce parents
//! whose status is folded from their children. The tree is built bottom-up
//! and owned top-down; nothing is shared between nodes except read-only
//! handles to probe metadata and message descriptions.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use super::message::Message;
use super::status::{Status, TrafficLight};
use super::subject::{Subject, SubjectKind};
use crate::domain::ports::probe::ProbeMeta;

/// What a measurement node was measured against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "level", rename_all = "snake_case")]
pub enum MeasurementSubject {
    System {
        label: Option<String>,
    },
    Dashboard {
        name: String,
        label: Option<String>,
    },
    TestSuite {
        name: String,
        label: Option<String>,
    },
    Testable {
        kind: SubjectKind,
        id: String,
        label: String,
    },
}

impl MeasurementSubject {
    /// Handle for a testable subject.
    pub fn testable(subject: &Subject) -> Self {
        Self::Testable {
            kind: subject.kind(),
            id: subject.id().to_string(),
            label: subject.label().to_string(),
        }
    }

    /// Display label of the node.
    pub fn display_label(&self) -> &str {
        match self {
            Self::System { label } => label.as_deref().unwrap_or("System"),
            Self::Dashboard { name, label } | Self::TestSuite { name, label } => {
                label.as_deref().unwrap_or(name)
            }
            Self::Testable { label, .. } => label,
        }
    }
}

/// Result of testing one subject at one level of the tree.
#[derive(Debug, Clone, Serialize)]
pub struct Measurement {
    pub status: Status,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Measurement>,
    /// Set by the runner once the probe or fold has completed
    pub subject: Option<MeasurementSubject>,
    /// Probe that produced a leaf
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe: Option<Arc<ProbeMeta>>,
    /// Unimportant nodes are kept in the tree but skipped by the parent fold
    pub important: bool,
    /// Wall-clock time of the probe call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed: Option<Duration>,
}

impl Default for Measurement {
    fn default() -> Self {
        Self::new(Status::Empty)
    }
}

impl Measurement {
    pub fn new(status: Status) -> Self {
        Self {
            status,
            messages: Vec::new(),
            children: Vec::new(),
            subject: None,
            probe: None,
            important: true,
            elapsed: None,
        }
    }

    pub fn good() -> Self {
        Self::new(Status::Good)
    }

    pub fn failed() -> Self {
        Self::new(Status::Failed)
    }

    pub fn not_applicable() -> Self {
        Self::new(Status::NotApplicable)
    }

    /// `Error` leaf carrying one error message.
    pub fn error(error: impl Into<String>) -> Self {
        Self::new(Status::Error).with_message(Message::error("error", error))
    }

    /// Parent node awaiting its children.
    pub fn parent(subject: MeasurementSubject) -> Self {
        Self::new(Status::InProgress).with_subject(subject)
    }

    #[must_use]
    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    #[must_use]
    pub fn with_subject(mut self, subject: MeasurementSubject) -> Self {
        self.subject = Some(subject);
        self
    }

    #[must_use]
    pub const fn with_important(mut self, important: bool) -> Self {
        self.important = important;
        self
    }

    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn add_child(&mut self, child: Self) {
        self.children.push(child);
    }

    pub fn is_leaf(&self) -> bool {
        self.probe.is_some()
    }

    /// A not-applicable node with nothing underneath carries no information.
    pub fn is_prunable(&self) -> bool {
        self.status == Status::NotApplicable && self.children.is_empty()
    }

    /// Set this node's status from its children.
    pub fn fold_children(&mut self) -> Status {
        self.status = fold_measurements(&self.children);
        self.status
    }

    /// Fold the children, move their messages into this node, and drop them.
    ///
    /// Used by probes that measure several sub-items but report as a single
    /// leaf.
    pub fn absorb_children(&mut self) {
        self.fold_children();
        for child in std::mem::take(&mut self.children) {
            self.messages.extend(child.messages);
        }
    }

    /// All probe leaves below (and including) this node, in tree order.
    pub fn leaves(&self) -> Vec<&Self> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Self>) {
        if self.is_leaf() {
            out.push(self);
        }
        for child in &self.children {
            child.collect_leaves(out);
        }
    }

    /// First node below this one measured against the given testable id.
    pub fn find_testable(&self, id: &str) -> Option<&Self> {
        if !self.is_leaf() {
            if let Some(MeasurementSubject::Testable { id: sid, .. }) = &self.subject {
                if sid == id {
                    return Some(self);
                }
            }
        }
        self.children.iter().find_map(|c| c.find_testable(id))
    }

    /// Name of the probe for a leaf.
    pub fn probe_name(&self) -> Option<&str> {
        self.probe.as_ref().map(|p| p.name.as_str())
    }
}

/// Fold a set of measurements, skipping unimportant ones.
pub fn fold_measurements(children: &[Measurement]) -> Status {
    let mut light = TrafficLight::new();
    for child in children.iter().filter(|c| c.important) {
        light.push(child.status);
    }
    light.status()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_constructor_carries_message() {
        let m = Measurement::error("host unreachable");
        assert_eq!(m.status, Status::Error);
        assert_eq!(m.messages.len(), 1);
        assert_eq!(m.messages[0].get_error(), Some("host unreachable"));
        assert!(m.messages[0].get_value().is_none());
    }

    #[test]
    fn test_fold_skips_unimportant_children() {
        let mut parent = Measurement::parent(MeasurementSubject::System { label: None });
        parent.add_child(Measurement::good());
        parent.add_child(Measurement::failed().with_important(false));
        assert_eq!(parent.fold_children(), Status::Good);
        assert_eq!(parent.children.len(), 2);
    }

    #[test]
    fn test_fold_only_unimportant_is_not_applicable() {
        let mut parent = Measurement::parent(MeasurementSubject::System { label: None });
        parent.add_child(Measurement::error("x").with_important(false));
        assert_eq!(parent.fold_children(), Status::NotApplicable);
    }

    #[test]
    fn test_absorb_children_merges_messages() {
        let mut m = Measurement::new(Status::Empty);
        m.add_child(Measurement::good().with_message(Message::value("a", 1_i64)));
        m.add_child(Measurement::failed().with_message(Message::value("b", 0_i64)));
        m.absorb_children();
        assert_eq!(m.status, Status::Mixed);
        assert!(m.children.is_empty());
        let names: Vec<_> = m.messages.iter().map(|x| x.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn test_prunable() {
        assert!(Measurement::not_applicable().is_prunable());
        let mut with_child = Measurement::not_applicable();
        with_child.add_child(Measurement::not_applicable());
        assert!(!with_child.is_prunable());
        assert!(!Measurement::good().is_prunable());
    }
}
