//! # Repository Fleet Library
//!
//! Discovers every git repository under a directory and runs the same
//! operation (fetch, pull, push, switch, cleanup, stash, tag, status) on all
//! of them in parallel, producing one outcome per repository.
//!
//! ## Quick Example
//!
//! ```no_run
//! use repo_fleet::bulk::{self, BulkOptions};
//! use repo_fleet::cancel::CancelToken;
//! use repo_fleet::git::SystemGit;
//! use repo_fleet::ops::{PullOp, PullStrategy};
//!
//! let options = BulkOptions {
//!     root: "/home/me/src".into(),
//!     include: Some("^work/".to_string()),
//!     ..BulkOptions::default()
//! };
//! let op = PullOp {
//!     strategy: PullStrategy::Rebase,
//!     stash: true,
//! };
//! let result = bulk::run(&options, &op, &SystemGit::new(), &CancelToken::new(), None)?;
//! for outcome in &result.outcomes {
//!     println!("{} {}", outcome.relative_path.display(), outcome.status);
//! }
//! # Ok::<(), repo_fleet::error::Error>(())
//! ```
//!
//! ## Execution Flow
//!
//! Data flows one way and no stage depends on a later one:
//!
//! 1.  **Scan** (`scanner`): walk the root, collect repository roots.
//! 2.  **Filter** (`filter`): apply the include/exclude patterns.
//! 3.  **Dispatch** (`dispatch`): run one pipeline per repository on a
//!     bounded worker pool, keeping results in scan order.
//! 4.  **Pipeline** (`pipeline`, `ops`): open, inspect (`repository`,
//!     `state`), preflight, then preview or execute one operation.
//! 5.  **Aggregate** (`summary`, `outcome`): count outcomes per status.
//!
//! All repository access goes through the [`git::GitExecutor`] trait, which
//! runs the git binary; nothing here reads the object database directly.

pub mod bulk;
pub mod cancel;
pub mod config;
pub mod defaults;
pub mod dispatch;
pub mod error;
pub mod filter;
pub mod git;
pub mod ops;
pub mod outcome;
pub mod output;
pub mod pipeline;
pub mod refspec;
pub mod repository;
pub mod scanner;
pub mod state;
pub mod status;
pub mod suggestions;
pub mod summary;

#[cfg(test)]
mod refspec_proptest;
