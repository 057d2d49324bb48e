//! Save, restore or count stash entries across repositories.

use crate::defaults::STASH_LABEL;
use crate::error::Result;
use crate::git::Git;
use crate::outcome::Verdict;
use crate::pipeline::{RepoContext, SyncOperation};
use crate::status::Status;

use super::{plural, run_checked};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StashAction {
    Save {
        message: Option<String>,
        include_untracked: bool,
    },
    Pop,
    /// Read-only: report how many entries each repository holds.
    List,
}

#[derive(Debug, Clone)]
pub struct StashOp {
    pub action: StashAction,
}

impl StashOp {
    pub fn new(action: StashAction) -> Self {
        Self { action }
    }
}

fn stash_entries(git: &Git<'_>) -> Result<usize> {
    Ok(git
        .output(&["stash", "list"])?
        .lines()
        .filter(|l| !l.trim().is_empty())
        .count())
}

/// Files a save would stash.
fn stashable(ctx: &RepoContext<'_>, include_untracked: bool) -> usize {
    let state = ctx.state;
    if include_untracked {
        state.uncommitted
    } else {
        state.uncommitted.saturating_sub(state.untracked)
    }
}

impl SyncOperation for StashOp {
    fn name(&self) -> &'static str {
        "stash"
    }

    fn blocks_on_conflicts(&self) -> bool {
        self.action != StashAction::List
    }

    fn check(&self, ctx: &RepoContext<'_>) -> Result<Option<Verdict>> {
        match &self.action {
            StashAction::Save {
                include_untracked, ..
            } => {
                if stashable(ctx, *include_untracked) == 0 {
                    return Ok(Some(Verdict::new(Status::NoChanges, "nothing to stash")));
                }
                Ok(None)
            }
            StashAction::Pop => {
                if stash_entries(&ctx.git)? == 0 {
                    return Ok(Some(Verdict::new(Status::NoStash, "no stash entries")));
                }
                Ok(None)
            }
            StashAction::List => {
                let entries = stash_entries(&ctx.git)?;
                let mut verdict = if entries == 0 {
                    Verdict::new(Status::NoStash, "no stash entries")
                } else {
                    Verdict::new(Status::Stashed, plural(entries, "stash entry"))
                };
                verdict.metrics.stash_entries = Some(entries);
                Ok(Some(verdict))
            }
        }
    }

    fn preview(&self, ctx: &RepoContext<'_>) -> Result<Verdict> {
        Ok(match &self.action {
            StashAction::Save {
                include_untracked, ..
            } => {
                let files = stashable(ctx, *include_untracked);
                Verdict::new(
                    Status::WouldStash,
                    format!("would stash {}", plural(files, "file")),
                )
                .with_files_changed(files)
            }
            StashAction::Pop | StashAction::List => {
                Verdict::new(Status::WouldPop, "would pop the latest stash entry")
            }
        })
    }

    fn execute(&self, ctx: &RepoContext<'_>) -> Result<Verdict> {
        let git = &ctx.git;
        match &self.action {
            StashAction::Save {
                message,
                include_untracked,
            } => {
                let files = stashable(ctx, *include_untracked);
                let label = message.clone().unwrap_or_else(|| STASH_LABEL.to_string());
                let mut args = vec!["stash", "push", "-m", label.as_str()];
                if *include_untracked {
                    args.push("--include-untracked");
                }
                run_checked(git, &args)?;
                Ok(Verdict::new(Status::Stashed, format!("stashed {}", plural(files, "file")))
                    .with_files_changed(files))
            }
            StashAction::Pop => {
                run_checked(git, &["stash", "pop"])?;
                let remaining = stash_entries(git)?;
                let mut verdict = Verdict::new(
                    Status::Popped,
                    format!("popped, {} left", plural(remaining, "entry")),
                );
                verdict.metrics.stash_entries = Some(remaining);
                Ok(verdict)
            }
            StashAction::List => Ok(self
                .check(ctx)?
                .unwrap_or_else(|| Verdict::new(Status::NoStash, "no stash entries"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::{mutating_calls, repo_dir, run, scripted};

    fn save(include_untracked: bool) -> StashOp {
        StashOp::new(StashAction::Save {
            message: None,
            include_untracked,
        })
    }

    #[test]
    fn test_save_clean_tree_is_no_changes() {
        let temp = repo_dir();
        let mock = scripted("main", false, None, "?? new.txt\n");
        let outcome = run(&save(false), &mock, temp.path(), false);
        assert_eq!(outcome.status, Status::NoChanges);
        assert!(mutating_calls(&mock).is_empty());
    }

    #[test]
    fn test_save_with_untracked() {
        let temp = repo_dir();
        let mock = scripted("main", false, None, "?? new.txt\n M a.txt\n")
            .ok(&["stash", "push"], "Saved working directory\n");
        let outcome = run(&save(true), &mock, temp.path(), false);
        assert_eq!(outcome.status, Status::Stashed);
        assert_eq!(outcome.metrics.files_changed, Some(2));
        assert_eq!(
            mutating_calls(&mock),
            vec!["stash push -m repo-fleet auto-stash --include-untracked"]
        );
    }

    #[test]
    fn test_pop_without_entries() {
        let temp = repo_dir();
        let mock = scripted("main", false, None, "").ok(&["stash", "list"], "");
        let op = StashOp::new(StashAction::Pop);
        let outcome = run(&op, &mock, temp.path(), false);
        assert_eq!(outcome.status, Status::NoStash);
        assert!(!mock.called("stash pop"));
    }

    #[test]
    fn test_pop_reports_remaining() {
        let temp = repo_dir();
        let mock = scripted("main", false, None, "")
            .ok(&["stash", "list"], "stash@{0}: On main: a\nstash@{1}: On main: b\n")
            .ok(&["stash", "list"], "stash@{0}: On main: b\n")
            .ok(&["stash", "pop"], "");
        let op = StashOp::new(StashAction::Pop);
        let outcome = run(&op, &mock, temp.path(), false);
        assert_eq!(outcome.status, Status::Popped);
        assert_eq!(outcome.metrics.stash_entries, Some(1));
    }

    #[test]
    fn test_list_is_read_only_even_with_conflicts() {
        let temp = repo_dir();
        let mock = scripted("main", false, None, "UU a.txt\n")
            .ok(&["stash", "list"], "stash@{0}: WIP on main\n");
        let op = StashOp::new(StashAction::List);
        let outcome = run(&op, &mock, temp.path(), false);
        assert_eq!(outcome.status, Status::Stashed);
        assert_eq!(outcome.message, "1 stash entry");
        assert_eq!(outcome.metrics.stash_entries, Some(1));
        assert!(mutating_calls(&mock).is_empty());
    }
}
