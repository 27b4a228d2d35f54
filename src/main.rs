//! cmon CLI entry point.

use clap::Parser;

use cmon::cli::{dispatch, handle_error, Cli, EXIT_ERROR};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let code = match dispatch(cli).await {
        Ok(code) => code,
        Err(err) => {
            handle_error(&err);
            EXIT_ERROR
        }
    };
    std::process::exit(code);
}
