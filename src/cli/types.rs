//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "cmon")]
#[command(about = "cmon - configuration-driven health checks", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file
    #[arg(short, long, global = true, env = "CMON_CONFIG", default_value = "cmon.yaml")]
    pub config: PathBuf,

    /// Log at debug level and show probe output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the effective configuration as YAML
    ShowConfig,

    /// List every configured subject with its probes
    ShowSubjects,

    /// Run the health checks once and print the results
    Run(RunArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct RunArgs {
    /// Report every probe as passing without contacting anything
    #[arg(long)]
    pub simulate: bool,

    /// Only test subjects whose id matches one of these globs
    #[arg(short = 's', long, value_delimiter = ',', num_args = 1..)]
    pub include_subjects: Vec<String>,

    /// Only run probes whose name or label matches one of these globs
    #[arg(short = 't', long, value_delimiter = ',', num_args = 1..)]
    pub include_tests: Vec<String>,

    /// Result format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Terminal)]
    pub output: OutputFormat,
}

/// How run results are written to stdout.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Colored tree
    Terminal,
    /// One `Type.id.probe=value` line per leaf and message
    Result,
    /// The full result tree as JSON
    Json,
}
