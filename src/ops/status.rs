//! Read-only health report.
//!
//! Runs the shared preflight (no remote, conflicts, stopped rebase/merge, no
//! upstream) and then reports `dirty` for uncommitted work. A clean branch is
//! `up-to-date` when it matches its upstream as of the last fetch, else
//! `skipped` with the ahead/behind counts in the metrics. A report never
//! lands in the dry-run category, whichever mode it runs in.

use crate::error::Result;
use crate::outcome::Verdict;
use crate::pipeline::{RepoContext, SyncOperation};
use crate::status::Status;

use super::plural;

#[derive(Debug, Clone, Copy, Default)]
pub struct StatusOp;

fn report(ctx: &RepoContext<'_>) -> Verdict {
    let state = ctx.state;
    if !state.is_clean() {
        let files = state.uncommitted;
        return Verdict::new(Status::Dirty, format!("{} uncommitted", plural(files, "file")))
            .with_files_changed(files);
    }

    let (ahead, behind) = ctx.info.ahead_behind().unwrap_or((0, 0));
    let upstream = &ctx.info.upstream;
    let message = match (ahead, behind) {
        (0, 0) => {
            return Verdict::new(Status::UpToDate, format!("in sync with {}", upstream))
                .with_divergence(0, 0)
        }
        (0, behind) => format!("behind {} by {}", upstream, plural(behind, "commit")),
        (ahead, 0) => format!("ahead of {} by {}", upstream, plural(ahead, "commit")),
        (ahead, behind) => {
            format!("diverged from {}: ahead {}, behind {}", upstream, ahead, behind)
        }
    };
    Verdict::new(Status::Skipped, message).with_divergence(ahead, behind)
}

impl SyncOperation for StatusOp {
    fn name(&self) -> &'static str {
        "status"
    }

    fn requires_remote(&self) -> bool {
        true
    }

    fn requires_upstream(&self, _ctx: &RepoContext<'_>) -> bool {
        true
    }

    fn check(&self, ctx: &RepoContext<'_>) -> Result<Option<Verdict>> {
        Ok(Some(report(ctx)))
    }

    fn preview(&self, ctx: &RepoContext<'_>) -> Result<Verdict> {
        Ok(report(ctx))
    }

    fn execute(&self, ctx: &RepoContext<'_>) -> Result<Verdict> {
        Ok(report(ctx))
    }
}
