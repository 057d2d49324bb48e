//! CLI argument parsing and command dispatch

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;

use repo_fleet::output::OutputConfig;

use crate::commands;

/// Repo Fleet - Run git operations across many repositories at once
#[derive(Parser, Debug)]
#[command(name = "repo-fleet")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level; RUST_LOG takes precedence when set
    #[arg(long, global = true, value_name = "LEVEL", value_enum, default_value = "warn")]
    log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the repositories found under a directory
    Scan(commands::scan::ScanArgs),
    /// Show the state of every repository
    Status(commands::status::StatusArgs),
    /// Fetch from remotes in every repository
    Fetch(commands::fetch::FetchArgs),
    /// Pull the upstream in every repository
    Pull(commands::pull::PullArgs),
    /// Push in every repository
    Push(commands::push::PushArgs),
    /// Switch every repository to a branch
    Switch(commands::switch::SwitchArgs),
    /// Delete merged branches in every repository
    Cleanup(commands::cleanup::CleanupArgs),
    /// Save, restore or list stashes in every repository
    Stash(commands::stash::StashArgs),
    /// Create or push tags in every repository
    Tag(commands::tag::TagArgs),
    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Install the stderr logger. `RUST_LOG`, when set, replaces `--log-level`.
    pub fn init_logging(&self) {
        let mut builder = env_logger::Builder::new();
        match std::env::var("RUST_LOG") {
            Ok(filters) if !filters.trim().is_empty() => {
                builder.parse_filters(&filters);
            }
            _ => {
                builder.filter_level(self.log_level.into());
            }
        }
        builder
            .target(env_logger::Target::Stderr)
            .format_timestamp(None)
            .format_target(false);
        // Fails only if a logger is already installed.
        let _ = builder.try_init();
    }

    /// Execute the CLI command
    pub fn execute(self) -> Result<ExitCode> {
        let output = OutputConfig::from_env_and_flag(&self.color);

        match self.command {
            Commands::Scan(args) => commands::scan::execute(args, &output),
            Commands::Status(args) => commands::status::execute(args, &output),
            Commands::Fetch(args) => commands::fetch::execute(args, &output),
            Commands::Pull(args) => commands::pull::execute(args, &output),
            Commands::Push(args) => commands::push::execute(args, &output),
            Commands::Switch(args) => commands::switch::execute(args, &output),
            Commands::Cleanup(args) => commands::cleanup::execute(args, &output),
            Commands::Stash(args) => commands::stash::execute(args, &output),
            Commands::Tag(args) => commands::tag::execute(args, &output),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_switch_with_dir() {
        let cli = Cli::try_parse_from(["repo-fleet", "switch", "feature", "ws", "-j", "3"]).unwrap();
        match cli.command {
            Commands::Switch(args) => {
                assert_eq!(args.branch, "feature");
                assert_eq!(args.bulk.dir, std::path::PathBuf::from("ws"));
                assert_eq!(args.bulk.parallel, Some(3));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["repo-fleet", "status", "--log-level", "debug", "--color", "never"])
                .unwrap();
        assert_eq!(cli.log_level, LogLevel::Debug);
        assert_eq!(cli.color, "never");
    }

    #[test]
    fn test_unknown_log_level_is_rejected() {
        assert!(Cli::try_parse_from(["repo-fleet", "status", "--log-level", "loud"]).is_err());
    }

    #[test]
    fn test_stash_and_tag_subcommands() {
        let cli = Cli::try_parse_from(["repo-fleet", "stash", "save", "-u", "-m", "wip"]).unwrap();
        assert!(matches!(cli.command, Commands::Stash(_)));
        let cli = Cli::try_parse_from(["repo-fleet", "tag", "create", "v1.0", "-m", "release"]).unwrap();
        assert!(matches!(cli.command, Commands::Tag(_)));
    }
}
