//! `cmon run`

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::output::render;
use crate::cli::types::RunArgs;
use crate::domain::models::config::RunConfig;
use crate::domain::models::context::{GlobSet, RunContext};
use crate::domain::models::measurement::Measurement;
use crate::services::System;

/// Build the run context from command-line flags and configured limits.
pub fn build_context(args: &RunArgs, run: &RunConfig, verbose: bool) -> Result<RunContext> {
    let mut context = RunContext::new()
        .with_simulate(args.simulate)
        .with_verbose(verbose)
        .with_probe_timeout(Duration::from_secs(run.probe_timeout_secs))
        .with_max_concurrency(run.max_concurrency);

    if !args.include_subjects.is_empty() {
        let subjects = GlobSet::new(&args.include_subjects).context("Invalid --include-subjects")?;
        info!(patterns = ?subjects.patterns(), "Subject filter");
        context = context.with_include_subjects(subjects);
    }
    if !args.include_tests.is_empty() {
        let tests = GlobSet::new(&args.include_tests).context("Invalid --include-tests")?;
        info!(patterns = ?tests.patterns(), "Test filter");
        context = context.with_include_tests(tests);
    }
    Ok(context)
}

/// Run the system once, print the result, and return the result tree.
pub async fn execute(
    system: &System,
    args: &RunArgs,
    run: &RunConfig,
    verbose: bool,
) -> Result<Measurement> {
    let context = build_context(args, run, verbose)?;
    let result = system.run(&context).await;

    let use_color = console::colors_enabled();
    print!("{}", render(&result, args.output, use_color)?);
    Ok(result)
}
