//! # Bulk Operations
//!
//! Each operation implements [`SyncOperation`](crate::pipeline::SyncOperation)
//! and supplies only its own preflight, preview and execute steps. The
//! pipeline does the rest.

pub mod cleanup;
pub mod fetch;
pub mod pull;
pub mod push;
pub mod stash;
pub mod status;
pub mod switch;
pub mod tag;

pub use cleanup::CleanupOp;
pub use fetch::FetchOp;
pub use pull::{PullOp, PullStrategy};
pub use push::PushOp;
pub use stash::{StashAction, StashOp};
pub use status::StatusOp;
pub use switch::SwitchOp;
pub use tag::{TagAction, TagOp};

use crate::error::{Error, Result};
use crate::git::{CommandOutput, Git};

/// Run a mutating command, turning a non-zero exit into an error the
/// pipeline can classify.
pub(crate) fn run_checked(git: &Git<'_>, args: &[&str]) -> Result<CommandOutput> {
    let out = git.run_mutating(args)?;
    if out.success() {
        Ok(out)
    } else {
        Err(git.command_error(args, &out))
    }
}

/// Resolve `rev` to a commit id, `None` if it does not exist.
pub(crate) fn resolve(git: &Git<'_>, rev: &str) -> Result<Option<String>> {
    let out = git.run(&["rev-parse", "--verify", "-q", rev])?;
    Ok(out.success().then(|| out.text().to_string()))
}

/// Number of commits in `range` (e.g. `a..b`).
pub(crate) fn count_commits(git: &Git<'_>, range: &str) -> Result<usize> {
    parse_count(git, &git.output(&["rev-list", "--count", range])?)
}

/// Whether `refs/heads/<name>` (or another full ref) exists.
pub(crate) fn ref_exists(git: &Git<'_>, full_ref: &str) -> Result<bool> {
    Ok(git
        .run(&["show-ref", "--verify", "--quiet", full_ref])?
        .success())
}

pub(crate) fn parse_count(git: &Git<'_>, text: &str) -> Result<usize> {
    text.trim().parse().map_err(|_| Error::GitCommand {
        command: "rev-list --count".to_string(),
        dir: git.dir().to_path_buf(),
        exit_code: 0,
        stderr: format!("unexpected output '{}'", text.trim()),
    })
}

/// `"1 commit"`, `"3 commits"`, `"2 branches"`, `"2 entries"`.
pub(crate) fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else if noun.ends_with("ch") || noun.ends_with('s') {
        format!("{} {}es", count, noun)
    } else if let Some(stem) = noun.strip_suffix('y') {
        format!("{} {}ies", count, stem)
    } else {
        format!("{} {}s", count, noun)
    }
}
