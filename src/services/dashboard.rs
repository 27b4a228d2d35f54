//! Dashboards: a named group of test suites.

use crate::domain::errors::DomainResult;
use crate::domain::models::context::RunContext;
use crate::domain::models::measurement::{Measurement, MeasurementSubject};

use super::binding::StandardTests;
use super::test_suite::TestSuite;

/// A named, ordered set of test suites shown together.
#[derive(Debug, Clone)]
pub struct Dashboard {
    name: String,
    label: Option<String>,
    test_suites: Vec<TestSuite>,
}

impl Dashboard {
    pub fn new(name: impl Into<String>, label: Option<String>, test_suites: Vec<TestSuite>) -> Self {
        Self {
            name: name.into(),
            label,
            test_suites,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn test_suites(&self) -> &[TestSuite] {
        &self.test_suites
    }

    pub fn validate(&self, standard: &StandardTests) -> DomainResult<()> {
        self.test_suites
            .iter()
            .try_for_each(|suite| suite.validate(standard))
    }

    /// Run every suite in order and fold their measurements.
    ///
    /// Suites that come back `NotApplicable` with nothing underneath are
    /// left out of the tree.
    pub async fn run(&self, standard: &StandardTests, context: &RunContext) -> Measurement {
        tracing::info!(dashboard = %self.name, suites = self.test_suites.len(), "Dashboard run");

        let mut result = Measurement::parent(MeasurementSubject::Dashboard {
            name: self.name.clone(),
            label: self.label.clone(),
        });
        for suite in &self.test_suites {
            let m = suite.run(standard, context).await;
            if m.is_prunable() {
                continue;
            }
            result.add_child(m);
        }
        result.fold_children();
        result
    }
}
