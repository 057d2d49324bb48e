//! Delete local branches that are already merged into a base branch.
//!
//! The base is, in order: the one given, the remote's default branch
//! (`refs/remotes/<remote>/HEAD`), a local `main` or `master`, the current
//! branch. The current branch, the base itself and protected names are never
//! deleted. Deletion uses `git branch -d`, so git refuses anything it does
//! not consider merged; such branches are kept and reported.

use crate::defaults::PROTECTED_BRANCHES;
use crate::error::Result;
use crate::outcome::Verdict;
use crate::pipeline::{RepoContext, SyncOperation};
use crate::refspec::validate_ref_name;
use crate::status::Status;

use super::{plural, ref_exists, run_checked};

#[derive(Debug, Clone)]
pub struct CleanupOp {
    pub base: Option<String>,
    /// Run `git remote prune` on the default remote first.
    pub prune: bool,
    pub protected: Vec<String>,
}

impl Default for CleanupOp {
    fn default() -> Self {
        Self {
            base: None,
            prune: false,
            protected: PROTECTED_BRANCHES.iter().map(|b| b.to_string()).collect(),
        }
    }
}

impl CleanupOp {
    fn base(&self, ctx: &RepoContext<'_>) -> Result<Option<String>> {
        let git = &ctx.git;
        if let Some(base) = &self.base {
            return Ok(Some(base.clone()));
        }
        if let Some(remote) = &ctx.info.remote {
            let head = format!("refs/remotes/{}/HEAD", remote);
            let out = git.run(&["symbolic-ref", "--short", "-q", head.as_str()])?;
            if out.success() && !out.text().is_empty() {
                return Ok(Some(out.text().to_string()));
            }
        }
        for candidate in ["main", "master"] {
            if ref_exists(git, &format!("refs/heads/{}", candidate))? {
                return Ok(Some(candidate.to_string()));
            }
        }
        Ok((!ctx.info.is_detached()).then(|| ctx.info.branch.clone()))
    }

    fn is_protected(&self, name: &str, base: &str, current: &str) -> bool {
        name == current
            || name == base
            || base.ends_with(&format!("/{}", name))
            || self.protected.iter().any(|p| p == name)
    }

    /// Merged branches that may be deleted.
    fn candidates(&self, ctx: &RepoContext<'_>, base: &str) -> Result<Vec<String>> {
        let merged = ctx.git.output(&[
            "branch",
            "--merged",
            base,
            "--format=%(refname:short)",
        ])?;
        Ok(merged
            .lines()
            .map(str::trim)
            .filter(|name| !name.is_empty() && !self.is_protected(name, base, &ctx.info.branch))
            .map(str::to_string)
            .collect())
    }

    fn prunes(&self, ctx: &RepoContext<'_>) -> Option<String> {
        if self.prune {
            ctx.info.remote.clone()
        } else {
            None
        }
    }
}

impl SyncOperation for CleanupOp {
    fn name(&self) -> &'static str {
        "cleanup"
    }

    fn validate(&self) -> Result<()> {
        match &self.base {
            Some(base) => validate_ref_name(base),
            None => Ok(()),
        }
    }

    fn blocks_on_conflicts(&self) -> bool {
        false
    }

    fn check(&self, ctx: &RepoContext<'_>) -> Result<Option<Verdict>> {
        let Some(base) = self.base(ctx)? else {
            return Ok(Some(Verdict::new(Status::Skipped, "no base branch to compare against")));
        };
        if self.candidates(ctx, &base)?.is_empty() && self.prunes(ctx).is_none() {
            return Ok(Some(Verdict::new(
                Status::UpToDate,
                format!("no branches merged into {}", base),
            )));
        }
        Ok(None)
    }

    fn preview(&self, ctx: &RepoContext<'_>) -> Result<Verdict> {
        let base = self.base(ctx)?.unwrap_or_default();
        let branches = self.candidates(ctx, &base)?;
        let mut message = if branches.is_empty() {
            format!("no branches merged into {}", base)
        } else {
            format!(
                "would delete {}: {}",
                plural(branches.len(), "branch"),
                branches.join(", ")
            )
        };
        if let Some(remote) = self.prunes(ctx) {
            message.push_str(&format!(", would prune {}", remote));
        }
        let mut verdict = Verdict::new(Status::WouldCleanup, message);
        verdict.metrics.branches_deleted = Some(branches.len());
        Ok(verdict)
    }

    fn execute(&self, ctx: &RepoContext<'_>) -> Result<Verdict> {
        let git = &ctx.git;
        if let Some(remote) = self.prunes(ctx) {
            run_checked(git, &["remote", "prune", remote.as_str()])?;
        }

        let base = self.base(ctx)?.unwrap_or_default();
        let mut deleted = Vec::new();
        let mut kept = Vec::new();
        for branch in self.candidates(ctx, &base)? {
            if git.run_mutating(&["branch", "-d", branch.as_str()])?.success() {
                deleted.push(branch);
            } else {
                kept.push(branch);
            }
        }

        let mut message = format!("deleted {}", plural(deleted.len(), "branch"));
        if !deleted.is_empty() {
            message.push_str(&format!(": {}", deleted.join(", ")));
        }
        if !kept.is_empty() {
            message.push_str(&format!(", kept {} not merged into HEAD", kept.join(", ")));
        }
        let status = if deleted.is_empty() && !kept.is_empty() {
            Status::Skipped
        } else {
            Status::CleanedUp
        };
        let mut verdict = Verdict::new(status, message);
        verdict.metrics.branches_deleted = Some(deleted.len());
        Ok(verdict)
    }
}
