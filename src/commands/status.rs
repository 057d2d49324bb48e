//! # Status Command Implementation
//!
//! Reports each repository's health without touching it: dirty trees,
//! conflicts, stopped rebases and merges, and whether the current branch is
//! ahead of or behind its upstream as of the last fetch.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use repo_fleet::ops::StatusOp;
use repo_fleet::output::OutputConfig;

use super::shared::{self, BulkArgs};

/// Show the state of every repository
#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub bulk: BulkArgs,
}

/// Execute the `status` command.
pub fn execute(args: StatusArgs, output: &OutputConfig) -> Result<ExitCode> {
    let config = args.bulk.load_config()?;
    shared::run(&args.bulk, &config, &StatusOp, output)
}
