//! # CLI Command Implementations
//!
//! One module per subcommand of the `repo-fleet` tool. Each contains an
//! `Args` struct derived with `clap` and an `execute` function that calls
//! into the `repo_fleet` library and returns the process exit code.
//!
//! Commands that walk a directory of repositories flatten [`shared::BulkArgs`]
//! and finish through [`shared::run`], so they all accept the same flags and
//! report the same way.

pub mod cleanup;
pub mod completions;
pub mod fetch;
pub mod pull;
pub mod push;
pub mod scan;
pub mod shared;
pub mod stash;
pub mod status;
pub mod switch;
pub mod tag;
