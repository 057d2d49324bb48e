//! # Cleanup Command Implementation
//!
//! Deletes local branches that are already merged into a base branch. The
//! current branch, the base and protected branches are never deleted.
//! Protected names come from `--protect`, else the configuration file's
//! `protected_branches`, else `main`, `master` and `develop`.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use repo_fleet::ops::CleanupOp;
use repo_fleet::output::OutputConfig;

use super::shared::{self, BulkArgs};

/// Delete merged branches in every repository
#[derive(Args, Debug)]
pub struct CleanupArgs {
    /// Branch that merged branches are compared against.
    #[arg(long, value_name = "BRANCH")]
    pub base: Option<String>,

    /// Prune stale remote-tracking branches first.
    #[arg(long)]
    pub prune: bool,

    /// Branch that must never be deleted; may be repeated.
    #[arg(long = "protect", value_name = "BRANCH")]
    pub protected: Vec<String>,

    #[command(flatten)]
    pub bulk: BulkArgs,
}

/// Execute the `cleanup` command.
pub fn execute(args: CleanupArgs, output: &OutputConfig) -> Result<ExitCode> {
    let config = args.bulk.load_config()?;
    let protected = if args.protected.is_empty() {
        config.protected_branches()
    } else {
        args.protected
    };
    let op = CleanupOp {
        base: args.base,
        prune: args.prune,
        protected,
    };
    shared::run(&args.bulk, &config, &op, output)
}
