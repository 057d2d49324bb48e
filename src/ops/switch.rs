//! Switch every repository to a branch.
//!
//! A branch that only exists on a remote is checked out with tracking. A
//! branch that exists nowhere is created when asked to, else reported as
//! `branch-not-found`.

use crate::error::Result;
use crate::outcome::Verdict;
use crate::pipeline::{RepoContext, SyncOperation};
use crate::refspec::validate_ref_name;
use crate::status::Status;

use super::{plural, ref_exists, run_checked};

#[derive(Debug, Clone, Default)]
pub struct SwitchOp {
    pub branch: String,
    /// Create the branch from HEAD when it exists nowhere.
    pub create: bool,
    /// Switch even with uncommitted changes.
    pub force: bool,
}

/// Where the target branch was found.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Local,
    /// Short name of the remote-tracking branch, e.g. `origin/feature`.
    Remote(String),
    Missing,
}

impl SwitchOp {
    pub fn new(branch: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
            ..Self::default()
        }
    }

    fn target(&self, ctx: &RepoContext<'_>) -> Result<Target> {
        let git = &ctx.git;
        if ref_exists(git, &format!("refs/heads/{}", self.branch))? {
            return Ok(Target::Local);
        }

        let listing = git.output(&["for-each-ref", "--format=%(refname:short)", "refs/remotes"])?;
        let mut candidates: Vec<&str> = listing
            .lines()
            .map(str::trim)
            .filter(|name| {
                ctx.info.remotes.keys().any(|remote| {
                    name.strip_prefix(remote.as_str())
                        .and_then(|rest| rest.strip_prefix('/'))
                        == Some(self.branch.as_str())
                })
            })
            .collect();
        // The default remote wins when several carry the branch.
        if let Some(default) = ctx.info.remote.as_deref() {
            let prefix = format!("{}/", default);
            candidates.sort_by_key(|name| !name.starts_with(prefix.as_str()));
        }
        Ok(match candidates.first() {
            Some(name) => Target::Remote(name.to_string()),
            None => Target::Missing,
        })
    }
}

impl SyncOperation for SwitchOp {
    fn name(&self) -> &'static str {
        "switch"
    }

    fn validate(&self) -> Result<()> {
        validate_ref_name(&self.branch)
    }

    fn check(&self, ctx: &RepoContext<'_>) -> Result<Option<Verdict>> {
        if ctx.info.branch == self.branch {
            return Ok(Some(Verdict::new(
                Status::AlreadyOnBranch,
                format!("already on {}", self.branch),
            )));
        }
        if !self.force && !ctx.state.is_clean() {
            let files = ctx.state.uncommitted + ctx.state.conflict_files.len();
            return Ok(Some(
                Verdict::new(
                    Status::Dirty,
                    format!("{} uncommitted, not switching", plural(files, "file")),
                )
                .with_files_changed(files),
            ));
        }
        if self.target(ctx)? == Target::Missing && !self.create {
            return Ok(Some(Verdict::new(
                Status::BranchNotFound,
                format!("no local or remote branch '{}'", self.branch),
            )));
        }
        Ok(None)
    }

    fn preview(&self, ctx: &RepoContext<'_>) -> Result<Verdict> {
        Ok(match self.target(ctx)? {
            Target::Local => Verdict::new(
                Status::WouldSwitch,
                format!("would switch to {}", self.branch),
            ),
            Target::Remote(remote_branch) => Verdict::new(
                Status::WouldSwitch,
                format!("would switch to {} tracking {}", self.branch, remote_branch),
            ),
            Target::Missing => Verdict::new(
                Status::WouldCreate,
                format!("would create {}", self.branch),
            ),
        })
    }

    fn execute(&self, ctx: &RepoContext<'_>) -> Result<Verdict> {
        let git = &ctx.git;
        let branch = self.branch.as_str();
        Ok(match self.target(ctx)? {
            Target::Local => {
                run_checked(git, &["checkout", branch])?;
                Verdict::new(Status::Switched, format!("switched to {}", branch))
            }
            Target::Remote(remote_branch) => {
                run_checked(git, &["checkout", "-b", branch, "--track", remote_branch.as_str()])?;
                Verdict::new(
                    Status::Switched,
                    format!("switched to {} tracking {}", branch, remote_branch),
                )
            }
            Target::Missing => {
                run_checked(git, &["checkout", "-b", branch])?;
                Verdict::new(Status::BranchCreated, format!("created {}", branch))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::mock::MockGit;
    use crate::pipeline::testing::{mutating_calls, repo_dir, run, scripted};

    fn with_branches(mock: MockGit, local: &[&str], remote: &str) -> MockGit {
        let mut mock = mock.ok(&["for-each-ref"], remote);
        for name in local {
            let full = format!("refs/heads/{}", name);
            mock = mock.ok(&["show-ref", "--verify", "--quiet", full.as_str()], "");
        }
        mock
    }

    #[test]
    fn test_already_on_branch() {
        let temp = repo_dir();
        let mock = scripted("main", false, None, "");
        let outcome = run(&SwitchOp::new("main"), &mock, temp.path(), false);
        assert_eq!(outcome.status, Status::AlreadyOnBranch);
    }

    #[test]
    fn test_dirty_tree_blocks_switch() {
        let temp = repo_dir();
        let mock = with_branches(
            scripted("main", true, Some((0, 0)), " M a.txt\n?? b.txt\n"),
            &["feature"],
            "",
        );
        let outcome = run(&SwitchOp::new("feature"), &mock, temp.path(), false);
        assert_eq!(outcome.status, Status::Dirty);
        assert_eq!(outcome.metrics.files_changed, Some(2));
        assert!(outcome.has_uncommitted_changes);
        assert_eq!(outcome.branch, "main");
        assert!(mutating_calls(&mock).is_empty());
    }

    #[test]
    fn test_force_switches_dirty_tree() {
        let temp = repo_dir();
        let mock = with_branches(scripted("main", false, None, " M a.txt\n"), &["feature"], "")
            .ok(&["checkout"], "");
        let op = SwitchOp {
            force: true,
            ..SwitchOp::new("feature")
        };
        let outcome = run(&op, &mock, temp.path(), false);
        assert_eq!(outcome.status, Status::Switched);
        assert_eq!(mutating_calls(&mock), vec!["checkout feature"]);
    }

    #[test]
    fn test_remote_branch_checked_out_with_tracking() {
        let temp = repo_dir();
        let mock = with_branches(
            scripted("main", true, Some((0, 0)), ""),
            &[],
            "origin/HEAD\norigin/main\norigin/feature\n",
        )
        .fail(&["show-ref"], "")
        .ok(&["checkout"], "");
        let outcome = run(&SwitchOp::new("feature"), &mock, temp.path(), false);
        assert_eq!(outcome.status, Status::Switched);
        assert_eq!(
            mutating_calls(&mock),
            vec!["checkout -b feature --track origin/feature"]
        );
    }

    #[test]
    fn test_missing_branch() {
        let temp = repo_dir();
        let mock = with_branches(scripted("main", true, Some((0, 0)), ""), &[], "origin/main\n")
            .fail(&["show-ref"], "");
        let outcome = run(&SwitchOp::new("nope"), &mock, temp.path(), false);
        assert_eq!(outcome.status, Status::BranchNotFound);
    }

    #[test]
    fn test_create_missing_branch() {
        let temp = repo_dir();
        let mock = with_branches(scripted("main", true, Some((0, 0)), ""), &[], "")
            .fail(&["show-ref"], "")
            .ok(&["checkout"], "");
        let op = SwitchOp {
            create: true,
            ..SwitchOp::new("feature/new")
        };

        let preview = run(&op, &mock, temp.path(), true);
        assert_eq!(preview.status, Status::WouldCreate);
        assert!(mutating_calls(&mock).is_empty());

        let outcome = run(&op, &mock, temp.path(), false);
        assert_eq!(outcome.status, Status::BranchCreated);
        assert_eq!(mutating_calls(&mock), vec!["checkout -b feature/new"]);
    }

    #[test]
    fn test_invalid_branch_name_runs_nothing() {
        let temp = repo_dir();
        let mock = MockGit::new();
        let outcome = run(&SwitchOp::new("bad name"), &mock, temp.path(), false);
        assert_eq!(outcome.status, Status::Error);
        assert!(mock.calls().is_empty());
    }
}
