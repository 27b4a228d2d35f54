//! The complete test environment.
//!
//! A [`System`] owns the standard-tests table and the dashboards. It is the
//! single entry point for a run: validate the binding once, then walk every
//! dashboard and fold their measurements into the system measurement.

use std::collections::HashSet;
use std::time::Instant;

use crate::domain::errors::DomainResult;
use crate::domain::models::context::RunContext;
use crate::domain::models::measurement::{Measurement, MeasurementSubject};
use crate::domain::models::subject::Subject;

use super::binding::StandardTests;
use super::dashboard::Dashboard;

/// Link shown as the first item of a dashboard navigation bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub title: String,
    pub url: String,
    pub tooltip: Option<String>,
}

/// Subjects, their probes and the dashboards that group them.
#[derive(Debug, Clone, Default)]
pub struct System {
    navigation: Option<Navigation>,
    standard_tests: StandardTests,
    dashboards: Vec<Dashboard>,
}

impl System {
    /// Build a system, validating every subject's probe binding.
    pub fn new(
        navigation: Option<Navigation>,
        standard_tests: StandardTests,
        dashboards: Vec<Dashboard>,
    ) -> DomainResult<Self> {
        let system = Self {
            navigation,
            standard_tests,
            dashboards,
        };
        system.validate()?;
        Ok(system)
    }

    pub fn navigation(&self) -> Option<&Navigation> {
        self.navigation.as_ref()
    }

    pub fn standard_tests(&self) -> &StandardTests {
        &self.standard_tests
    }

    pub fn dashboards(&self) -> &[Dashboard] {
        &self.dashboards
    }

    /// Fail on the first probe bound to a subject of the wrong kind.
    pub fn validate(&self) -> DomainResult<()> {
        self.dashboards
            .iter()
            .try_for_each(|d| d.validate(&self.standard_tests))
    }

    /// Every subject that appears in any suite, once, in first-seen order.
    pub fn all_subjects(&self) -> Vec<&Subject> {
        let mut seen = HashSet::new();
        self.dashboards
            .iter()
            .flat_map(Dashboard::test_suites)
            .flat_map(|suite| suite.subjects())
            .filter(|s| seen.insert((s.kind(), s.id().to_string())))
            .collect()
    }

    /// Run every dashboard once and return the full result tree.
    pub async fn run(&self, context: &RunContext) -> Measurement {
        let start = Instant::now();
        tracing::info!(
            dashboards = self.dashboards.len(),
            simulate = context.simulate,
            started_at = %context.started_at,
            "System run"
        );

        let mut result = Measurement::parent(MeasurementSubject::System {
            label: self.navigation.as_ref().map(|n| n.title.clone()),
        });
        for dashboard in &self.dashboards {
            let m = dashboard.run(&self.standard_tests, context).await;
            if m.is_prunable() {
                continue;
            }
            result.add_child(m);
        }
        let status = result.fold_children();

        tracing::info!(
            status = %status,
            leaves = result.leaves().len(),
            elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "System run complete"
        );
        result
    }
}
