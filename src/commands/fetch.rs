//! # Fetch Command Implementation
//!
//! Fetches the upstream's remote in every repository (or every remote with
//! `--all-remotes`) and reports how many new upstream commits arrived.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use repo_fleet::ops::FetchOp;
use repo_fleet::output::OutputConfig;

use super::shared::{self, BulkArgs};

/// Fetch from remotes in every repository
#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Fetch every configured remote, not just the upstream's.
    #[arg(long)]
    pub all_remotes: bool,

    /// Remove remote-tracking refs that no longer exist on the remote.
    #[arg(long)]
    pub prune: bool,

    /// Fetch all tags as well.
    #[arg(long)]
    pub tags: bool,

    #[command(flatten)]
    pub bulk: BulkArgs,
}

/// Execute the `fetch` command.
pub fn execute(args: FetchArgs, output: &OutputConfig) -> Result<ExitCode> {
    let config = args.bulk.load_config()?;
    let op = FetchOp {
        all_remotes: args.all_remotes,
        prune: args.prune,
        tags: args.tags,
    };
    shared::run(&args.bulk, &config, &op, output)
}
