//! Per-invocation run context.

use chrono::{DateTime, Utc};
use glob::{MatchOptions, Pattern};
use std::time::Duration;

use crate::domain::errors::DomainError;

const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// A set of case-insensitive glob patterns.
#[derive(Debug, Clone)]
pub struct GlobSet {
    patterns: Vec<Pattern>,
}

impl GlobSet {
    /// Compile patterns, lower-casing them first.
    pub fn new<I, S>(patterns: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| {
                let p = p.as_ref().to_lowercase();
                Pattern::new(&p).map_err(|e| DomainError::InvalidPattern {
                    pattern: p.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// True when any pattern matches `candidate`, ignoring case.
    pub fn matches(&self, candidate: &str) -> bool {
        let candidate = candidate.to_lowercase();
        let options = MatchOptions {
            case_sensitive: false,
            require_literal_separator: false,
            require_literal_leading_dot: false,
        };
        self.patterns
            .iter()
            .any(|p| p.matches_with(&candidate, options))
    }

    /// The compiled patterns, lower-cased.
    pub fn patterns(&self) -> Vec<&str> {
        self.patterns.iter().map(Pattern::as_str).collect()
    }
}

/// Immutable settings shared by every probe call of one run.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Probes skip their side effects and return without error
    pub simulate: bool,
    pub verbose: bool,
    /// Only probes whose name or label matches are run
    pub include_tests: Option<GlobSet>,
    /// Only subjects whose id matches are run
    pub include_subjects: Option<GlobSet>,
    pub started_at: DateTime<Utc>,
    /// Upper bound on a single probe call
    pub probe_timeout: Duration,
    /// Subjects probed concurrently within one test suite
    pub max_concurrency: usize,
}

impl Default for RunContext {
    fn default() -> Self {
        Self {
            simulate: false,
            verbose: false,
            include_tests: None,
            include_subjects: None,
            started_at: Utc::now(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_simulate(mut self, simulate: bool) -> Self {
        self.simulate = simulate;
        self
    }

    #[must_use]
    pub const fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    #[must_use]
    pub fn with_include_tests(mut self, tests: GlobSet) -> Self {
        self.include_tests = Some(tests);
        self
    }

    #[must_use]
    pub fn with_include_subjects(mut self, subjects: GlobSet) -> Self {
        self.include_subjects = Some(subjects);
        self
    }

    #[must_use]
    pub const fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_max_concurrency(mut self, n: usize) -> Self {
        self.max_concurrency = n.max(1);
        self
    }
}
