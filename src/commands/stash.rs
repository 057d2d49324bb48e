//! # Stash Command Implementation
//!
//! `stash save`, `stash pop` and `stash list` across every repository.

use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Subcommand};

use repo_fleet::ops::{StashAction, StashOp};
use repo_fleet::output::OutputConfig;

use super::shared::{self, BulkArgs};

/// Save, restore or list stashes in every repository
#[derive(Args, Debug)]
pub struct StashArgs {
    #[command(subcommand)]
    pub action: StashCommand,
}

#[derive(Subcommand, Debug)]
pub enum StashCommand {
    /// Stash uncommitted changes
    Save {
        /// Stash message.
        #[arg(short, long)]
        message: Option<String>,

        /// Stash untracked files too.
        #[arg(short = 'u', long)]
        include_untracked: bool,

        #[command(flatten)]
        bulk: BulkArgs,
    },
    /// Restore the most recent stash entry
    Pop {
        #[command(flatten)]
        bulk: BulkArgs,
    },
    /// Count stash entries
    List {
        #[command(flatten)]
        bulk: BulkArgs,
    },
}

/// Execute the `stash` command.
pub fn execute(args: StashArgs, output: &OutputConfig) -> Result<ExitCode> {
    let (action, bulk) = match args.action {
        StashCommand::Save {
            message,
            include_untracked,
            bulk,
        } => (
            StashAction::Save {
                message,
                include_untracked,
            },
            bulk,
        ),
        StashCommand::Pop { bulk } => (StashAction::Pop, bulk),
        StashCommand::List { bulk } => (StashAction::List, bulk),
    };
    let config = bulk.load_config()?;
    shared::run(&bulk, &config, &StashOp::new(action), output)
}
