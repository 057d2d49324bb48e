//! # Tag Command Implementation
//!
//! Creates the same tag in every repository, or pushes all tags.

use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Subcommand};

use repo_fleet::ops::{TagAction, TagOp};
use repo_fleet::output::OutputConfig;

use super::shared::{self, BulkArgs};

/// Create or push tags in every repository
#[derive(Args, Debug)]
pub struct TagArgs {
    #[command(subcommand)]
    pub action: TagCommand,
}

#[derive(Subcommand, Debug)]
pub enum TagCommand {
    /// Tag HEAD
    Create {
        /// Tag name.
        #[arg(value_name = "NAME")]
        name: String,

        /// Create an annotated tag with this message.
        #[arg(short, long)]
        message: Option<String>,

        #[command(flatten)]
        bulk: BulkArgs,
    },
    /// Push all tags to the default remote
    Push {
        #[command(flatten)]
        bulk: BulkArgs,
    },
}

/// Execute the `tag` command.
pub fn execute(args: TagArgs, output: &OutputConfig) -> Result<ExitCode> {
    let (action, bulk) = match args.action {
        TagCommand::Create {
            name,
            message,
            bulk,
        } => (TagAction::Create { name, message }, bulk),
        TagCommand::Push { bulk } => (TagAction::Push, bulk),
    };
    let config = bulk.load_config()?;
    shared::run(&bulk, &config, &TagOp::new(action), output)
}
