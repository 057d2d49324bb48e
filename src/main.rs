//! # Repo Fleet CLI
//!
//! Binary entry point for the `repo-fleet` command-line tool: parses the
//! arguments, installs the logger, runs the command and maps the result to
//! an exit code (0 when every repository succeeded or was skipped, 1 when any
//! failed or the command could not run, 2 for usage errors from `clap`).
//!
//! The work itself lives in the `repo_fleet` library crate.

mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    cli.init_logging();
    match cli.execute() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
