//! Command-line interface
//!
//! Argument parsing, command dispatch and result rendering for the `cmon`
//! binary.

pub mod commands;
pub mod output;
pub mod types;

pub use types::{Cli, Commands, OutputFormat, RunArgs};

use anyhow::Result;

use crate::domain::models::status::Status;
use crate::infrastructure::config::{build_system, ConfigLoader};
use crate::infrastructure::logging::LoggerImpl;
use crate::infrastructure::probes::ProbeCatalog;

/// Exit code for a run whose result is not entirely good.
pub const EXIT_UNHEALTHY: i32 = 1;
/// Exit code for configuration and other fatal errors.
pub const EXIT_ERROR: i32 = 2;

/// Load configuration, start logging, and dispatch the parsed command.
///
/// Returns the process exit code.
pub async fn dispatch(cli: Cli) -> Result<i32> {
    let config = ConfigLoader::load(&cli.config)?;
    LoggerImpl::init(&config.logging, cli.verbose)?;

    match &cli.command {
        Commands::ShowConfig => {
            commands::show_config::execute(&config)?;
            Ok(0)
        }
        Commands::ShowSubjects => {
            let system = build_system(&config, &ProbeCatalog::builtin())?;
            commands::show_subjects::execute(&system);
            Ok(0)
        }
        Commands::Run(args) => {
            let system = build_system(&config, &ProbeCatalog::builtin())?;
            let result = commands::run::execute(&system, args, &config.run, cli.verbose).await?;
            Ok(exit_code(result.status))
        }
    }
}

/// Exit code for a finished run.
pub const fn exit_code(status: Status) -> i32 {
    match status {
        Status::Good | Status::NotApplicable | Status::Empty => 0,
        Status::Failed | Status::Error | Status::Mixed | Status::InProgress => EXIT_UNHEALTHY,
    }
}

/// Print a fatal error with its cause chain.
pub fn handle_error(err: &anyhow::Error) {
    eprintln!("{} {err:#}", console::style("error:").red().bold());
}
