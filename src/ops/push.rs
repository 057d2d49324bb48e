//! Push the current branch (or an explicit refspec) to one or more remotes.
//!
//! Target remotes resolve in order: the explicit list, every configured
//! remote when `all_remotes` is set, else the upstream's remote (falling back
//! to the default remote). Each remote is attempted on its own. The combined
//! outcome is `auth-required` if any remote rejected credentials, `error` if
//! any other push failed, else `pushed` or `up-to-date`.
//!
//! Pushed commits are counted per remote as the commits of the source not yet
//! on any of that remote's tracking refs, and only credited when the
//! remote-tracking ref actually moved.

use log::debug;

use crate::error::Result;
use crate::git::is_auth_failure;
use crate::outcome::Verdict;
use crate::pipeline::{RepoContext, SyncOperation};
use crate::refspec::ParsedRefspec;
use crate::repository::RepositoryInfo;
use crate::status::Status;

use super::{parse_count, plural, resolve};

#[derive(Debug, Clone, Default)]
pub struct PushOp {
    /// `[+]source[:destination]`, validated per repository.
    pub refspec: Option<String>,
    pub remotes: Vec<String>,
    pub all_remotes: bool,
    /// Force with lease, never a blind force.
    pub force: bool,
    pub tags: bool,
    pub set_upstream: bool,
}

/// What one remote received.
#[derive(Debug, Default)]
struct RemoteResult {
    commits: usize,
    moved: bool,
    new_tags: usize,
}

impl PushOp {
    fn parsed(&self) -> Result<Option<ParsedRefspec>> {
        self.refspec.as_deref().map(ParsedRefspec::parse).transpose()
    }

    fn targets(&self, info: &RepositoryInfo) -> std::result::Result<Vec<String>, String> {
        if !self.remotes.is_empty() {
            if let Some(unknown) = self.remotes.iter().find(|r| !info.remotes.contains_key(*r)) {
                return Err(format!("unknown remote '{}'", unknown));
            }
            return Ok(self.remotes.clone());
        }
        if self.all_remotes {
            return Ok(info.remotes.keys().cloned().collect());
        }
        Ok(info
            .upstream_remote()
            .or(info.remote.as_deref())
            .map(|r| vec![r.to_string()])
            .unwrap_or_default())
    }

    /// Source and destination branch for `remote`.
    fn branches(
        &self,
        parsed: Option<&ParsedRefspec>,
        info: &RepositoryInfo,
        remote: &str,
    ) -> (String, String) {
        if let Some(parsed) = parsed {
            return (
                parsed.source_branch().to_string(),
                parsed.destination_branch().to_string(),
            );
        }
        let destination = match (info.upstream_remote(), info.upstream_branch()) {
            (Some(upstream), Some(branch)) if upstream == remote => branch.to_string(),
            _ => info.branch.clone(),
        };
        (info.branch.clone(), destination)
    }

    fn push_one(
        &self,
        ctx: &RepoContext<'_>,
        parsed: Option<&ParsedRefspec>,
        remote: &str,
    ) -> Result<std::result::Result<RemoteResult, String>> {
        let git = &ctx.git;
        let (source, destination) = self.branches(parsed, ctx.info, remote);
        let tracking = format!("refs/remotes/{}/{}", remote, destination);

        let before = resolve(git, &tracking)?;
        let not_on_remote = format!("--remotes={}", remote);
        let pending = git.output(&[
            "rev-list",
            "--count",
            source.as_str(),
            "--not",
            not_on_remote.as_str(),
        ])?;
        let pending = parse_count(git, &pending)?;

        let spec = match parsed {
            Some(parsed) => parsed.to_string(),
            None => format!("refs/heads/{}:refs/heads/{}", source, destination),
        };
        let mut args = vec!["push"];
        if self.force {
            args.push("--force-with-lease");
        }
        if self.tags {
            args.push("--tags");
        }
        if self.set_upstream {
            args.push("--set-upstream");
        }
        args.push(remote);
        args.push(&spec);

        let out = git.run_mutating(&args)?;
        if !out.success() {
            debug!("push to {} failed: {}", remote, out.diagnostics());
            return Ok(Err(out.diagnostics().to_string()));
        }

        let after = resolve(git, &tracking)?;
        let moved = before != after;
        Ok(Ok(RemoteResult {
            commits: if moved { pending } else { 0 },
            moved,
            new_tags: out.stderr.matches("[new tag]").count(),
        }))
    }
}

impl SyncOperation for PushOp {
    fn name(&self) -> &'static str {
        "push"
    }

    fn validate(&self) -> Result<()> {
        self.parsed().map(|_| ())
    }

    fn requires_remote(&self) -> bool {
        true
    }

    /// Without a refspec a branch with no upstream still pushes to the same
    /// name on the default remote. Only a detached HEAD has nothing to name.
    fn requires_upstream(&self, ctx: &RepoContext<'_>) -> bool {
        self.refspec.is_none() && ctx.info.is_detached()
    }

    fn check(&self, ctx: &RepoContext<'_>) -> Result<Option<Verdict>> {
        let targets = match self.targets(ctx.info) {
            Ok(targets) => targets,
            Err(message) => return Ok(Some(Verdict::new(Status::Error, message))),
        };

        let only_upstream = ctx.info.upstream_remote().is_some_and(|u| targets == [u]);
        if self.refspec.is_none()
            && !self.tags
            && !self.force
            && only_upstream
            && ctx.info.ahead_behind().is_some_and(|(ahead, _)| ahead == 0)
        {
            return Ok(Some(Verdict::new(
                Status::NothingToPush,
                format!("nothing to push to {}", ctx.info.upstream),
            )));
        }
        Ok(None)
    }

    fn preview(&self, ctx: &RepoContext<'_>) -> Result<Verdict> {
        let targets = self.targets(ctx.info).unwrap_or_default();
        let mut verdict = match (&self.refspec, ctx.info.ahead_behind()) {
            (None, Some((ahead, _))) => Verdict::new(
                Status::WouldPush,
                format!("would push {} to {}", plural(ahead, "commit"), targets.join(", ")),
            )
            .with_commits(ahead),
            (Some(spec), _) => Verdict::new(
                Status::WouldPush,
                format!("would push {} to {}", spec, targets.join(", ")),
            ),
            (None, None) => Verdict::new(
                Status::WouldPush,
                format!("would push {} to {}", ctx.info.branch, targets.join(", ")),
            ),
        };
        verdict.metrics.remotes = Some(targets.len());
        Ok(verdict)
    }

    fn execute(&self, ctx: &RepoContext<'_>) -> Result<Verdict> {
        let parsed = self.parsed()?;
        let targets = self.targets(ctx.info).unwrap_or_default();

        let mut commits = 0;
        let mut moved = false;
        let mut new_tags = 0;
        let mut auth_failures = Vec::new();
        let mut failures = Vec::new();

        for remote in &targets {
            match self.push_one(ctx, parsed.as_ref(), remote)? {
                Ok(result) => {
                    commits += result.commits;
                    moved |= result.moved;
                    new_tags += result.new_tags;
                }
                Err(stderr) if is_auth_failure(&stderr) => {
                    auth_failures.push(format!("{}: {}", remote, stderr))
                }
                Err(stderr) => failures.push(format!("{}: {}", remote, stderr)),
            }
        }

        let mut verdict = if !auth_failures.is_empty() {
            Verdict::auth_required(&auth_failures.join("\n"))
        } else if !failures.is_empty() {
            Verdict::new(
                Status::Error,
                format!("push failed on {} of {}", failures.len(), plural(targets.len(), "remote")),
            )
            .with_error(failures.join("\n"))
        } else if moved || new_tags > 0 {
            let mut message = format!(
                "pushed {} to {}",
                plural(commits, "commit"),
                targets.join(", ")
            );
            if new_tags > 0 {
                message.push_str(&format!(" and {}", plural(new_tags, "tag")));
            }
            Verdict::new(Status::Pushed, message).with_commits(commits)
        } else {
            Verdict::new(Status::UpToDate, "everything up to date")
        };
        verdict.metrics.remotes = Some(targets.len());
        Ok(verdict)
    }
}
