//! # Push Command Implementation
//!
//! Pushes the current branch (or an explicit refspec) in every repository.
//! Repositories with nothing to push are skipped without contacting the
//! remote. A malformed refspec is reported per repository before anything
//! is sent.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use repo_fleet::ops::PushOp;
use repo_fleet::output::OutputConfig;

use super::shared::{self, BulkArgs};

/// Push in every repository
#[derive(Args, Debug)]
pub struct PushArgs {
    /// Refspec to push, `[+]source[:destination]`.
    #[arg(long, value_name = "REFSPEC")]
    pub refspec: Option<String>,

    /// Remote to push to; may be repeated.
    #[arg(long = "remote", value_name = "NAME")]
    pub remotes: Vec<String>,

    /// Push to every configured remote.
    #[arg(long, conflicts_with = "remotes")]
    pub all_remotes: bool,

    /// Overwrite the remote branch if it has not moved since the last fetch.
    #[arg(short, long)]
    pub force: bool,

    /// Push tags as well.
    #[arg(long)]
    pub tags: bool,

    /// Create the upstream for branches that have none.
    #[arg(short = 'u', long)]
    pub set_upstream: bool,

    #[command(flatten)]
    pub bulk: BulkArgs,
}

/// Execute the `push` command.
pub fn execute(args: PushArgs, output: &OutputConfig) -> Result<ExitCode> {
    let config = args.bulk.load_config()?;
    let op = PushOp {
        refspec: args.refspec,
        remotes: args.remotes,
        all_remotes: args.all_remotes,
        force: args.force,
        tags: args.tags,
        set_upstream: args.set_upstream,
    };
    shared::run(&args.bulk, &config, &op, output)
}
