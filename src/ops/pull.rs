//! Pull the upstream into the current branch.
//!
//! The reported commit count comes from comparing HEAD before and after the
//! pull, never from the ahead/behind counts loaded up front: those reflect
//! whatever the remote-tracking ref held at the last fetch.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::outcome::Verdict;
use crate::pipeline::{RepoContext, SyncOperation};
use crate::status::Status;

use super::{count_commits, parse_count, plural, resolve, run_checked};

/// How the upstream is integrated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PullStrategy {
    #[default]
    Merge,
    Rebase,
    FfOnly,
}

impl PullStrategy {
    fn flag(self) -> &'static str {
        match self {
            PullStrategy::Merge => "--no-rebase",
            PullStrategy::Rebase => "--rebase",
            PullStrategy::FfOnly => "--ff-only",
        }
    }
}

impl FromStr for PullStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "merge" => Ok(PullStrategy::Merge),
            "rebase" => Ok(PullStrategy::Rebase),
            "ff-only" => Ok(PullStrategy::FfOnly),
            other => Err(Error::InvalidStrategy {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for PullStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PullStrategy::Merge => "merge",
            PullStrategy::Rebase => "rebase",
            PullStrategy::FfOnly => "ff-only",
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct PullOp {
    pub strategy: PullStrategy,
    /// Stash tracked changes around the pull.
    pub stash: bool,
}

impl SyncOperation for PullOp {
    fn name(&self) -> &'static str {
        "pull"
    }

    fn requires_remote(&self) -> bool {
        true
    }

    fn requires_upstream(&self, _ctx: &RepoContext<'_>) -> bool {
        true
    }

    fn check(&self, ctx: &RepoContext<'_>) -> Result<Option<Verdict>> {
        if self.strategy == PullStrategy::Rebase && !self.stash && ctx.state.has_tracked_changes()
        {
            let files = ctx.state.uncommitted.saturating_sub(ctx.state.untracked);
            return Ok(Some(Verdict::new(
                Status::Dirty,
                format!("{} would block a rebase", plural(files, "changed file")),
            )));
        }
        Ok(None)
    }

    fn wants_stash(&self) -> bool {
        self.stash
    }

    fn aborts_on_conflict(&self) -> bool {
        true
    }

    fn preview(&self, ctx: &RepoContext<'_>) -> Result<Verdict> {
        let behind = ctx.info.behind;
        Ok(if behind > 0 {
            Verdict::new(
                Status::WouldPull,
                format!(
                    "would pull {} from {} ({})",
                    plural(behind, "commit"),
                    ctx.info.upstream,
                    self.strategy
                ),
            )
            .with_commits(behind)
        } else {
            Verdict::new(
                Status::UpToDate,
                format!("{} has nothing new as of the last fetch", ctx.info.upstream),
            )
        })
    }

    fn execute(&self, ctx: &RepoContext<'_>) -> Result<Verdict> {
        let git = &ctx.git;
        let before = resolve(git, "HEAD")?;
        run_checked(git, &["pull", "--no-edit", self.strategy.flag()])?;
        let after = resolve(git, "HEAD")?;

        let Some(after) = after else {
            return Ok(Verdict::new(Status::UpToDate, "nothing to pull"));
        };
        if before.as_deref() == Some(after.as_str()) {
            return Ok(Verdict::new(Status::UpToDate, "already up to date"));
        }

        let (commits, files) = match &before {
            Some(before) => {
                let commits = count_commits(git, &format!("{}..{}", before, after))?;
                let diff = git.output(&["diff", "--name-only", before.as_str(), after.as_str()])?;
                (commits, diff.lines().filter(|l| !l.is_empty()).count())
            }
            None => (
                parse_count(git, &git.output(&["rev-list", "--count", after.as_str()])?)?,
                0,
            ),
        };

        Ok(Verdict::new(
            Status::Pulled,
            format!(
                "pulled {} ({})",
                plural(commits, "commit"),
                plural(files, "file")
            ),
        )
        .with_commits(commits)
        .with_files_changed(files))
    }
}
