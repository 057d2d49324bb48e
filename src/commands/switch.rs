//! # Switch Command Implementation
//!
//! Checks out the same branch in every repository, tracking a remote branch
//! when only the remote has it and creating it with `--create` when nothing
//! has it.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use repo_fleet::ops::SwitchOp;
use repo_fleet::output::OutputConfig;

use super::shared::{self, BulkArgs};

/// Switch every repository to a branch
#[derive(Args, Debug)]
pub struct SwitchArgs {
    /// Branch to check out.
    #[arg(value_name = "BRANCH")]
    pub branch: String,

    /// Create the branch from HEAD where it does not exist.
    #[arg(short, long)]
    pub create: bool,

    /// Switch even when the working tree has uncommitted changes.
    #[arg(short, long)]
    pub force: bool,

    #[command(flatten)]
    pub bulk: BulkArgs,
}

/// Execute the `switch` command.
pub fn execute(args: SwitchArgs, output: &OutputConfig) -> Result<ExitCode> {
    let config = args.bulk.load_config()?;
    let op = SwitchOp {
        branch: args.branch,
        create: args.create,
        force: args.force,
    };
    shared::run(&args.bulk, &config, &op, output)
}
