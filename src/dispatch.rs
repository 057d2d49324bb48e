//! # Bounded Dispatcher
//!
//! Fans a per-repository worker out over a dedicated rayon pool whose size is
//! the concurrency limit, so at most `limit` workers ever run at once.
//!
//! Results come back index-aligned with the input: `par_iter().map().collect()`
//! writes each worker's outcome into its own slot, so no merge lock is
//! needed. A worker that fails (or panics) produces an `error` outcome for its
//! repository and the rest of the batch carries on. Only cancellation or a
//! failure to build the pool aborts the dispatch.

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use log::{debug, warn};
use rayon::prelude::*;

use crate::cancel::CancelToken;
use crate::defaults::DEFAULT_PARALLELISM;
use crate::error::{Error, Result};
use crate::outcome::{relative_to, OperationOutcome, Verdict};

/// Progress callback: `(current, total, path)`, fired as each repository
/// starts. `current` is always within `1..=total`.
pub type ProgressFn<'a> = dyn Fn(usize, usize, &Path) + Sync + 'a;

/// Runs workers with a concurrency cap.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher {
    limit: usize,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PARALLELISM,
        }
    }
}

impl Dispatcher {
    pub fn new(limit: usize) -> Result<Self> {
        if limit == 0 {
            return Err(Error::InvalidConfig {
                message: "parallelism must be at least 1".to_string(),
            });
        }
        Ok(Self { limit })
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Run `worker` once per repository and return the outcomes in input
    /// order.
    ///
    /// Once `cancel` fires no new worker starts; workers already running see
    /// the token through their git calls. A cancelled dispatch returns
    /// `Error::Cancelled` instead of a partial result.
    pub fn run<W>(
        &self,
        root: &Path,
        repos: &[PathBuf],
        cancel: &CancelToken,
        progress: Option<&ProgressFn<'_>>,
        worker: W,
    ) -> Result<Vec<OperationOutcome>>
    where
        W: Fn(&Path) -> Result<OperationOutcome> + Sync,
    {
        cancel.check()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.limit)
            .thread_name(|i| format!("repo-fleet-worker-{}", i))
            .build()
            .map_err(|e| Error::InvalidConfig {
                message: format!("failed to start worker pool: {}", e),
            })?;

        let total = repos.len();
        let started = AtomicUsize::new(0);
        // Serializes progress reporting so callbacks see `current` in order.
        let progress_lock = Mutex::new(());

        let slots: Vec<Option<OperationOutcome>> = pool.install(|| {
            repos
                .par_iter()
                .map(|path| {
                    if cancel.is_cancelled() {
                        return None;
                    }
                    {
                        let _guard = progress_lock.lock().unwrap_or_else(|e| e.into_inner());
                        let current = started.fetch_add(1, Ordering::SeqCst) + 1;
                        if let Some(progress) = progress {
                            progress(current, total, path);
                        }
                    }
                    Some(run_isolated(root, path, &worker))
                })
                .collect()
        });

        cancel.check()?;
        slots.into_iter().collect::<Option<Vec<_>>>().ok_or(Error::Cancelled)
    }
}

/// Run one worker, turning an error or a panic into an `error` outcome.
fn run_isolated<W>(root: &Path, path: &Path, worker: &W) -> OperationOutcome
where
    W: Fn(&Path) -> Result<OperationOutcome> + Sync,
{
    match panic::catch_unwind(AssertUnwindSafe(|| worker(path))) {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(err)) => {
            debug!("{}: {}", path.display(), err);
            OperationOutcome::new(
                path.to_path_buf(),
                relative_to(root, path),
                Verdict::error(&err),
            )
        }
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            warn!("{}: worker panicked: {}", path.display(), message);
            OperationOutcome::new(
                path.to_path_buf(),
                relative_to(root, path),
                Verdict::new(crate::status::Status::Error, "worker panicked")
                    .with_error(message),
            )
        }
    }
}
