//! Fetch from the upstream's remote, or from every remote.

use crate::error::Result;
use crate::outcome::Verdict;
use crate::pipeline::{RepoContext, SyncOperation};
use crate::status::Status;

use super::{count_commits, plural, resolve, run_checked};

#[derive(Debug, Clone, Default)]
pub struct FetchOp {
    pub all_remotes: bool,
    pub prune: bool,
    pub tags: bool,
}

impl FetchOp {
    fn remote<'c>(&self, ctx: &'c RepoContext<'_>) -> &'c str {
        ctx.info
            .upstream_remote()
            .or(ctx.info.remote.as_deref())
            .unwrap_or("origin")
    }

    fn target(&self, ctx: &RepoContext<'_>) -> String {
        if self.all_remotes {
            "all remotes".to_string()
        } else {
            self.remote(ctx).to_string()
        }
    }
}

impl SyncOperation for FetchOp {
    fn name(&self) -> &'static str {
        "fetch"
    }

    fn requires_remote(&self) -> bool {
        true
    }

    fn requires_upstream(&self, _ctx: &RepoContext<'_>) -> bool {
        !self.all_remotes
    }

    fn blocks_on_conflicts(&self) -> bool {
        // Fetching never touches the working tree.
        false
    }

    fn preview(&self, ctx: &RepoContext<'_>) -> Result<Verdict> {
        Ok(Verdict::new(
            Status::WouldFetch,
            format!("would fetch {}", self.target(ctx)),
        ))
    }

    fn execute(&self, ctx: &RepoContext<'_>) -> Result<Verdict> {
        let git = &ctx.git;
        let tracked = ctx.info.has_upstream();
        let before = if tracked { resolve(git, "@{u}")? } else { None };

        let mut args = vec!["fetch"];
        if self.all_remotes {
            args.push("--all");
        } else {
            args.push(self.remote(ctx));
        }
        if self.prune {
            args.push("--prune");
        }
        if self.tags {
            args.push("--tags");
        }
        run_checked(git, &args)?;

        let after = if tracked { resolve(git, "@{u}")? } else { None };
        Ok(match (before, after) {
            (Some(before), Some(after)) if before != after => {
                let commits = count_commits(git, &format!("{}..{}", before, after))?;
                Verdict::new(
                    Status::Fetched,
                    format!("fetched {} on {}", plural(commits, "new commit"), ctx.info.upstream),
                )
                .with_commits(commits)
            }
            (Some(_), Some(_)) => Verdict::new(
                Status::UpToDate,
                format!("{} unchanged", ctx.info.upstream),
            ),
            _ => Verdict::new(Status::Fetched, format!("fetched {}", self.target(ctx))),
        })
    }
}
