//! # Change-Sync Pipeline
//!
//! Every bulk operation runs through the same per-repository state machine:
//!
//! ```text
//! Opened -> InfoLoaded -> StatusLoaded -> PreflightChecked -> [Stashed]
//!        -> {DryRunReported | Executed} -> [Unstashed] -> Finalized
//! ```
//!
//! Operations plug in through the [`SyncOperation`] trait. The pipeline owns
//! the shared policy:
//!
//! - Operation arguments (refspecs, branch and tag names) are validated right
//!   after opening, before any git command runs.
//! - Preflight checks run in a fixed priority order: no remote, conflicts,
//!   rebase in progress, merge in progress, no upstream, then the
//!   operation's own checks.
//! - Dry runs go through the same preflight and then stop before any
//!   mutating command.
//! - A failed command is classified as `auth-required` when stderr matches a
//!   known authentication failure. Operations that opt in get an automatic
//!   rebase/merge abort when the command left conflicts behind.
//! - A protective stash is popped on the way out. A failed pop is a warning,
//!   never a status change.
//!
//! Per-repository errors never escape [`Pipeline::run`]; they become `error`
//! outcomes. Only cancellation is returned as `Err`.

use std::path::Path;
use std::time::Instant;

use log::{debug, warn};

use crate::cancel::CancelToken;
use crate::defaults::STASH_LABEL;
use crate::error::{Error, Result, Warning};
use crate::git::{is_auth_failure, Git, GitExecutor};
use crate::outcome::{relative_to, OperationOutcome, Verdict};
use crate::repository::{RepositoryHandle, RepositoryInfo};
use crate::state::{classify, RepositoryState};
use crate::status::Status;

/// Everything an operation may look at for one repository.
#[derive(Clone, Copy)]
pub struct RepoContext<'a> {
    pub git: Git<'a>,
    pub handle: &'a RepositoryHandle,
    pub info: &'a RepositoryInfo,
    pub state: &'a RepositoryState,
}

/// One bulk operation, plugged into the shared pipeline.
///
/// `check`, `preview` and `execute` see the same [`RepoContext`]. Only
/// `execute` may run mutating commands. An `Err` from `execute` is a failed
/// command; the pipeline classifies it.
pub trait SyncOperation: Send + Sync {
    /// Short name used in logs and the stash label.
    fn name(&self) -> &'static str;

    /// Validate operation arguments. Runs before any git command.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    fn requires_remote(&self) -> bool {
        false
    }

    fn requires_upstream(&self, _ctx: &RepoContext<'_>) -> bool {
        false
    }

    /// Whether conflicts or an in-progress rebase/merge stop the operation.
    fn blocks_on_conflicts(&self) -> bool {
        true
    }

    /// Operation-specific preflight. `Some` terminates the run.
    fn check(&self, _ctx: &RepoContext<'_>) -> Result<Option<Verdict>> {
        Ok(None)
    }

    /// Protect tracked changes with a stash around `execute`.
    fn wants_stash(&self) -> bool {
        false
    }

    /// Abort a rebase/merge left behind by a failed `execute`.
    fn aborts_on_conflict(&self) -> bool {
        false
    }

    /// Describe what `execute` would do, without mutating anything.
    fn preview(&self, ctx: &RepoContext<'_>) -> Result<Verdict>;

    fn execute(&self, ctx: &RepoContext<'_>) -> Result<Verdict>;
}

/// Flags shared by every operation in a bulk call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    pub dry_run: bool,
    /// Skip collecting uncommitted-file counts on the outcome.
    pub ignore_dirty: bool,
}

/// Facts collected along the way that end up on the outcome.
#[derive(Default)]
struct RunRecord {
    branch: String,
    state: Option<RepositoryState>,
    stashed: bool,
    warnings: Vec<String>,
}

impl RunRecord {
    fn warn(&mut self, path: &Path, warning: Warning) {
        warn!("{}: {}", path.display(), warning);
        self.warnings.push(warning.to_string());
    }
}

/// Runs one [`SyncOperation`] against one repository.
pub struct Pipeline<'a> {
    exec: &'a dyn GitExecutor,
    cancel: &'a CancelToken,
    root: &'a Path,
    options: PipelineOptions,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        exec: &'a dyn GitExecutor,
        cancel: &'a CancelToken,
        root: &'a Path,
        options: PipelineOptions,
    ) -> Self {
        Self {
            exec,
            cancel,
            root,
            options,
        }
    }

    pub fn options(&self) -> PipelineOptions {
        self.options
    }

    /// Run `op` against the repository at `path`.
    pub fn run(&self, op: &dyn SyncOperation, path: &Path) -> Result<OperationOutcome> {
        let started = Instant::now();
        let mut record = RunRecord::default();

        let verdict = match self.drive(op, path, &mut record) {
            Ok(verdict) => verdict,
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(err) => {
                debug!("{} {}: {}", op.name(), path.display(), err);
                Verdict::error(&err)
            }
        };

        let mut outcome =
            OperationOutcome::new(path.to_path_buf(), relative_to(self.root, path), verdict);
        outcome.duration = started.elapsed();
        outcome.branch = record.branch;
        outcome.stashed = record.stashed;
        outcome.warnings = record.warnings;
        if !self.options.ignore_dirty {
            if let Some(state) = record.state {
                outcome.uncommitted_files = state.uncommitted + state.conflict_files.len();
                outcome.has_uncommitted_changes = outcome.uncommitted_files > 0;
            }
        }
        Ok(outcome)
    }

    fn drive(
        &self,
        op: &dyn SyncOperation,
        path: &Path,
        record: &mut RunRecord,
    ) -> Result<Verdict> {
        self.cancel.check()?;
        let handle = RepositoryHandle::open(path)?;
        op.validate()?;

        let git = Git::new(self.exec, self.cancel, &handle.path);
        let info = RepositoryInfo::load(&git)?;
        record.branch = info.branch.clone();
        let state = classify(&handle, &git)?;
        record.state = Some(state.clone());

        let ctx = RepoContext {
            git,
            handle: &handle,
            info: &info,
            state: &state,
        };

        if let Some(verdict) = preflight(op, &ctx)? {
            return Ok(verdict);
        }
        if self.options.dry_run {
            return op.preview(&ctx);
        }

        if op.wants_stash() && state.has_tracked_changes() {
            stash_push(&git, op.name())?;
            record.stashed = true;
        }

        let verdict = match op.execute(&ctx) {
            Ok(verdict) => verdict,
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(err) => classify_failure(op, &ctx, err, record)?,
        };

        if record.stashed {
            if let Err(warning) = stash_pop(&git) {
                record.warn(path, warning);
            }
        }

        // Report the tree as the operation left it.
        match classify(&handle, &git) {
            Ok(after) => record.state = Some(after),
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(err) => debug!("{}: re-classify failed: {}", path.display(), err),
        }
        Ok(verdict)
    }
}

/// Shared preflight, in priority order.
fn preflight(op: &dyn SyncOperation, ctx: &RepoContext<'_>) -> Result<Option<Verdict>> {
    if op.requires_remote() && !ctx.info.has_remote() {
        return Ok(Some(Verdict::new(Status::NoRemote, "no remote configured")));
    }
    if op.blocks_on_conflicts() {
        if let Some(verdict) = in_progress_verdict(ctx.state) {
            return Ok(Some(verdict));
        }
    }
    if op.requires_upstream(ctx) && !ctx.info.has_upstream() {
        let message = if ctx.info.is_detached() {
            "HEAD is detached".to_string()
        } else {
            format!("branch '{}' has no upstream", ctx.info.branch)
        };
        return Ok(Some(Verdict::new(Status::NoUpstream, message)));
    }
    op.check(ctx)
}

/// The blocking verdict for unresolved conflicts or a stopped rebase/merge.
pub fn in_progress_verdict(state: &RepositoryState) -> Option<Verdict> {
    if state.has_conflicts() {
        let message = format!("{} conflicted file(s)", state.conflict_files.len());
        return Some(
            Verdict::new(Status::Conflict, message).with_conflicts(state.conflict_files.clone()),
        );
    }
    if state.rebase_in_progress {
        return Some(Verdict::new(Status::RebaseInProgress, "rebase in progress"));
    }
    if state.merge_in_progress {
        return Some(Verdict::new(Status::MergeInProgress, "merge in progress"));
    }
    None
}

/// Turn a failed `execute` into a terminal verdict.
fn classify_failure(
    op: &dyn SyncOperation,
    ctx: &RepoContext<'_>,
    err: Error,
    record: &mut RunRecord,
) -> Result<Verdict> {
    if let Error::GitCommand { stderr, .. } = &err {
        if is_auth_failure(stderr) {
            return Ok(Verdict::auth_required(stderr));
        }
    }

    if op.aborts_on_conflict() {
        let after = classify(ctx.handle, &ctx.git)?;
        if after.has_conflicts() || after.rebase_in_progress || after.merge_in_progress {
            if let Err(warning) = abort_in_progress(&ctx.git, &after) {
                record.warn(&ctx.handle.path, warning);
            }
            let message = format!(
                "conflicts in {} file(s), {} aborted",
                after.conflict_files.len(),
                op.name()
            );
            return Ok(Verdict::new(Status::Conflict, message)
                .with_conflicts(after.conflict_files)
                .with_error(err.to_string()));
        }
    }

    debug!("{} {}: {}", op.name(), ctx.handle.path.display(), err);
    Ok(Verdict::error(&err))
}

/// Abort whichever of rebase or merge is stopped. Best effort.
fn abort_in_progress(git: &Git<'_>, state: &RepositoryState) -> std::result::Result<(), Warning> {
    let args: &[&str] = if state.rebase_in_progress {
        &["rebase", "--abort"]
    } else if state.merge_in_progress {
        &["merge", "--abort"]
    } else {
        return Ok(());
    };
    best_effort(git, "abort", args)
}

fn stash_push(git: &Git<'_>, op_name: &str) -> Result<()> {
    let label = format!("{} ({})", STASH_LABEL, op_name);
    let args = ["stash", "push", "-m", label.as_str()];
    let out = git.run_mutating(&args)?;
    if out.success() {
        Ok(())
    } else {
        Err(git.command_error(&args, &out))
    }
}

fn stash_pop(git: &Git<'_>) -> std::result::Result<(), Warning> {
    best_effort(git, "stash pop", &["stash", "pop"])
}

fn best_effort(
    git: &Git<'_>,
    action: &'static str,
    args: &[&str],
) -> std::result::Result<(), Warning> {
    match git.run_mutating(args) {
        Ok(out) if out.success() => Ok(()),
        Ok(out) => Err(Warning::new(action, out.diagnostics())),
        Err(err) => Err(Warning::new(action, err.to_string())),
    }
}
