//! Per-repository outcomes and the batch result that collects them.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::error::Error;
use crate::status::Status;
use crate::summary::Summary;

/// Operation-specific numbers attached to an outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Metrics {
    /// Commits transferred (pulled, pushed, fetched).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commits: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files_changed: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branches_deleted: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stash_entries: Option<usize>,
    /// Remotes a push was attempted against.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remotes: Option<usize>,
    /// Commits on the branch but not its upstream, as of the last fetch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ahead: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub behind: Option<usize>,
}

/// What an operation decided for one repository, before the pipeline adds
/// timing and working-tree facts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub status: Status,
    pub message: String,
    pub error: Option<String>,
    pub metrics: Metrics,
    pub conflict_files: Vec<String>,
}

impl Verdict {
    pub fn new(status: Status, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            error: None,
            metrics: Metrics::default(),
            conflict_files: Vec::new(),
        }
    }

    /// A terminal `error` verdict carrying the error text.
    pub fn error(err: &Error) -> Self {
        let text = err.to_string();
        Self {
            error: Some(text.clone()),
            ..Self::new(Status::Error, text)
        }
    }

    /// A terminal `auth-required` verdict.
    pub fn auth_required(stderr: &str) -> Self {
        Self {
            error: Some(stderr.trim().to_string()),
            ..Self::new(Status::AuthRequired, "authentication required")
        }
    }

    pub fn with_commits(mut self, commits: usize) -> Self {
        self.metrics.commits = Some(commits);
        self
    }

    pub fn with_files_changed(mut self, files: usize) -> Self {
        self.metrics.files_changed = Some(files);
        self
    }

    pub fn with_divergence(mut self, ahead: usize, behind: usize) -> Self {
        self.metrics.ahead = Some(ahead);
        self.metrics.behind = Some(behind);
        self
    }

    pub fn with_conflicts(mut self, files: Vec<String>) -> Self {
        self.conflict_files = files;
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// The final record for one repository in one bulk call.
#[derive(Debug, Clone, Serialize)]
pub struct OperationOutcome {
    pub path: PathBuf,
    /// Path relative to the scan root.
    pub relative_path: PathBuf,
    pub status: Status,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(rename = "duration_ms", serialize_with = "as_millis")]
    pub duration: Duration,
    /// Branch checked out when the run started, empty if unknown/detached.
    pub branch: String,
    pub metrics: Metrics,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conflict_files: Vec<String>,
    pub has_uncommitted_changes: bool,
    pub uncommitted_files: usize,
    /// A protective stash was pushed (and popped) around the operation.
    pub stashed: bool,
    /// Best-effort actions that failed without changing the status.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl OperationOutcome {
    pub fn new(path: PathBuf, relative_path: PathBuf, verdict: Verdict) -> Self {
        Self {
            path,
            relative_path,
            status: verdict.status,
            message: verdict.message,
            error: verdict.error,
            duration: Duration::ZERO,
            branch: String::new(),
            metrics: verdict.metrics,
            conflict_files: verdict.conflict_files,
            has_uncommitted_changes: false,
            uncommitted_files: 0,
            stashed: false,
            warnings: Vec::new(),
        }
    }
}

/// `path` relative to the scan `root`; `.` for the root itself.
pub fn relative_to(root: &Path, path: &Path) -> PathBuf {
    match path.strip_prefix(root) {
        Ok(rel) if rel.as_os_str().is_empty() => PathBuf::from("."),
        Ok(rel) => rel.to_path_buf(),
        Err(_) => path.to_path_buf(),
    }
}

fn as_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}

/// The complete result of one bulk call.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub root: PathBuf,
    /// Repositories found by the scanner.
    pub total_discovered: usize,
    /// Repositories left after filtering, each of which has an outcome.
    pub total_processed: usize,
    /// One outcome per processed repository, in scan order.
    pub outcomes: Vec<OperationOutcome>,
    #[serde(rename = "duration_ms", serialize_with = "as_millis")]
    pub duration: Duration,
    pub summary: Summary,
}

impl BatchResult {
    pub fn has_failures(&self) -> bool {
        self.outcomes.iter().any(|o| o.status.is_failure())
    }
}
