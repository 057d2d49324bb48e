//! # Pull Command Implementation
//!
//! Pulls the upstream into the current branch of every repository.
//!
//! - **Strategy**: `--strategy merge|rebase|ff-only`, defaulting to the
//!   configuration file's `pull_strategy`, then `merge`.
//! - **Auto-stash**: `--stash` stashes tracked changes before the pull and
//!   restores them afterwards.
//! - **Conflicts**: a pull that stops on conflicts is aborted, leaving the
//!   repository as it was, and reported as `conflict` with the files involved.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use repo_fleet::ops::{PullOp, PullStrategy};
use repo_fleet::output::OutputConfig;
use repo_fleet::suggestions;

use super::shared::{self, BulkArgs};

/// Pull the upstream in every repository
#[derive(Args, Debug)]
pub struct PullArgs {
    /// How to integrate the upstream: merge, rebase or ff-only.
    #[arg(long, value_name = "STRATEGY")]
    pub strategy: Option<String>,

    /// Stash uncommitted changes around the pull.
    #[arg(long)]
    pub stash: bool,

    #[command(flatten)]
    pub bulk: BulkArgs,
}

/// Execute the `pull` command.
pub fn execute(args: PullArgs, output: &OutputConfig) -> Result<ExitCode> {
    let config = args.bulk.load_config()?;
    let strategy = match args.strategy.as_deref() {
        Some(value) => value
            .parse::<PullStrategy>()
            .map_err(|_| suggestions::unknown_strategy(value))?,
        None => config.pull_strategy(),
    };
    let op = PullOp {
        strategy,
        stash: args.stash,
    };
    shared::run(&args.bulk, &config, &op, output)
}
