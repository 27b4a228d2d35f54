//! Traffic-light status model.
//!
//! A [`Status`] is the verdict attached to every node of a result tree. Leaf
//! probes produce `Good`, `Failed`, `Error` or `NotApplicable`; parent levels
//! compute their status by folding the statuses of their children.
//!
//! The fold is the join of a small semilattice:
//!
//! ```text
//!              Mixed
//!             /     \
//!          Good     Error
//!                     |
//!                  Failed
//!             \     /
//!              Empty
//! ```
//!
//! `NotApplicable` and `Empty` are inert: folding them in never changes the
//! accumulated value. Because the merge is a join it is commutative,
//! associative and idempotent, so merging children one at a time in any
//! order gives the same answer as folding the whole set at once.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Traffic-light status of a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Measurement was made and was successful
    Good,
    /// Measurement was made but a problem was detected
    Failed,
    /// Measurement could not be made due to an error
    Error,
    /// Measurement was skipped as not relevant
    NotApplicable,
    /// Children disagree: some good, some not
    Mixed,
    /// Parent whose children have not been folded yet
    InProgress,
    /// Nothing has been folded into this status yet
    #[default]
    Empty,
}

impl Status {
    /// Stable lowercase name used by the flat export and terminal output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Failed => "failed",
            Self::Error => "error",
            Self::NotApplicable => "n/a",
            Self::Mixed => "mixed",
            Self::InProgress => "in-progress",
            Self::Empty => "empty",
        }
    }

    /// Inert statuses are transparent to aggregation.
    pub fn is_inert(&self) -> bool {
        matches!(self, Self::NotApplicable | Self::Empty)
    }

    /// `Failed` or `Error`.
    pub fn is_bad(&self) -> bool {
        matches!(self, Self::Failed | Self::Error)
    }

    /// Incrementally merge one child status into a running ancestor status.
    ///
    /// - an `Error` child forces `Error` unless a `Good` has been seen
    /// - a `Good` after `Error` or `Failed` gives `Mixed`, never overwrites
    /// - a `Failed` after `Good` gives `Mixed`
    /// - `Mixed` and `InProgress` children force `Mixed`
    #[must_use]
    pub fn merge(self, child: Self) -> Self {
        if child.is_inert() {
            return self;
        }
        let child = if child == Self::InProgress {
            Self::Mixed
        } else {
            child
        };

        match (self, child) {
            (Self::Empty | Self::NotApplicable, c) => c,
            (Self::Mixed | Self::InProgress, _) | (_, Self::Mixed) => Self::Mixed,
            (Self::Good, Self::Good) => Self::Good,
            (Self::Good, _) | (_, Self::Good) => Self::Mixed,
            (Self::Error, _) | (_, Self::Error) => Self::Error,
            (Self::Failed, _) => Self::Failed,
        }
    }

    /// Resolve an accumulator into a final parent status.
    ///
    /// An accumulator that never saw a contributing child means the parent
    /// has nothing to report.
    #[must_use]
    pub fn settle(self) -> Self {
        if self.is_inert() {
            Self::NotApplicable
        } else {
            self
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Batch fold of a set of child statuses into a parent status.
///
/// Returns `NotApplicable` when no child contributes.
pub fn fold<I>(statuses: I) -> Status
where
    I: IntoIterator<Item = Status>,
{
    statuses
        .into_iter()
        .fold(Status::Empty, Status::merge)
        .settle()
}

/// Running traffic light for a parent whose children arrive one at a time.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrafficLight {
    state: Status,
    contributors: usize,
}

impl TrafficLight {
    /// Start with nothing folded in.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one child status.
    pub fn push(&mut self, status: Status) {
        if !status.is_inert() {
            self.contributors += 1;
        }
        self.state = self.state.merge(status);
    }

    /// Number of children that contributed to the status so far.
    pub fn contributors(&self) -> usize {
        self.contributors
    }

    /// Current (possibly unsettled) state.
    pub fn current(&self) -> Status {
        self.state
    }

    /// Final status.
    pub fn status(&self) -> Status {
        self.state.settle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_empty_is_not_applicable() {
        assert_eq!(fold([]), Status::NotApplicable);
        assert_eq!(fold([Status::Empty, Status::NotApplicable]), Status::NotApplicable);
    }

    #[test]
    fn test_fold_all_good() {
        assert_eq!(fold([Status::Good, Status::Good]), Status::Good);
    }

    #[test]
    fn test_fold_all_bad() {
        assert_eq!(fold([Status::Failed, Status::Failed]), Status::Failed);
        assert_eq!(fold([Status::Failed, Status::Error]), Status::Error);
        assert_eq!(fold([Status::Error]), Status::Error);
    }

    #[test]
    fn test_fold_mixed() {
        assert_eq!(
            fold([Status::Good, Status::Good, Status::Failed]),
            Status::Mixed
        );
        assert_eq!(fold([Status::Good, Status::Error]), Status::Mixed);
        assert_eq!(fold([Status::Mixed]), Status::Mixed);
        assert_eq!(fold([Status::Good, Status::InProgress]), Status::Mixed);
    }

    #[test]
    fn test_error_then_good_is_mixed() {
        let mut light = TrafficLight::new();
        light.push(Status::Error);
        assert_eq!(light.current(), Status::Error);
        light.push(Status::Good);
        assert_eq!(light.status(), Status::Mixed);
    }

    #[test]
    fn test_failed_then_error_is_error() {
        assert_eq!(Status::Failed.merge(Status::Error), Status::Error);
        assert_eq!(Status::Error.merge(Status::Failed), Status::Error);
    }

    #[test]
    fn test_good_then_failed_is_mixed() {
        assert_eq!(Status::Good.merge(Status::Failed), Status::Mixed);
    }

    #[test]
    fn test_inert_is_identity() {
        for s in [Status::Good, Status::Failed, Status::Error, Status::Mixed] {
            assert_eq!(s.merge(Status::NotApplicable), s);
            assert_eq!(s.merge(Status::Empty), s);
        }
    }

    #[test]
    fn test_contributor_count_skips_inert() {
        let mut light = TrafficLight::new();
        light.push(Status::NotApplicable);
        light.push(Status::Good);
        light.push(Status::Empty);
        assert_eq!(light.contributors(), 1);
    }

    #[test]
    fn test_default_is_empty() {
        assert_eq!(Status::default(), Status::Empty);
        assert_eq!(Status::default().as_str(), "empty");
    }
}
