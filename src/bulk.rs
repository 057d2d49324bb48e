//! # Bulk Entry Point
//!
//! `scan -> filter -> dispatch -> aggregate`. Everything that can make the
//! whole call invalid (the root directory, the patterns, the parallelism) is
//! checked before the first repository is touched. After that, per-repository
//! failures only ever show up in that repository's outcome, so
//! `total_processed` always equals the number of repositories selected.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::info;

use crate::cancel::CancelToken;
use crate::defaults::DEFAULT_PARALLELISM;
use crate::dispatch::{Dispatcher, ProgressFn};
use crate::error::{Error, Result};
use crate::filter::PatternFilter;
use crate::git::GitExecutor;
use crate::outcome::BatchResult;
use crate::pipeline::{Pipeline, PipelineOptions, SyncOperation};
use crate::scanner::{scan, ScanOptions};
use crate::summary::Summary;

/// Inputs shared by every bulk call.
#[derive(Debug, Clone)]
pub struct BulkOptions {
    pub root: PathBuf,
    pub scan: ScanOptions,
    pub include: Option<String>,
    pub exclude: Option<String>,
    pub parallel: usize,
    pub pipeline: PipelineOptions,
}

impl Default for BulkOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            scan: ScanOptions::default(),
            include: None,
            exclude: None,
            parallel: DEFAULT_PARALLELISM,
            pipeline: PipelineOptions::default(),
        }
    }
}

/// Repositories selected for a bulk call.
#[derive(Debug, Clone)]
pub struct Discovery {
    /// Canonical scan root.
    pub root: PathBuf,
    /// Repositories found before filtering.
    pub discovered: usize,
    /// Repositories left after filtering, sorted by path.
    pub repositories: Vec<PathBuf>,
}

/// Validate the root and patterns, then scan and filter.
pub fn discover(options: &BulkOptions, cancel: &CancelToken) -> Result<Discovery> {
    let root = validate_root(&options.root)?;
    let filter = PatternFilter::new(options.include.as_deref(), options.exclude.as_deref())?;

    let found = scan(&root, options.scan, cancel)?;
    let discovered = found.len();
    let repositories = filter.apply(&root, found);
    info!(
        "discovered {} repositories under {}, {} selected",
        discovered,
        root.display(),
        repositories.len()
    );

    Ok(Discovery {
        root,
        discovered,
        repositories,
    })
}

/// Run `op` over every selected repository.
pub fn run(
    options: &BulkOptions,
    op: &dyn SyncOperation,
    exec: &dyn GitExecutor,
    cancel: &CancelToken,
    progress: Option<&ProgressFn<'_>>,
) -> Result<BatchResult> {
    let started = Instant::now();
    let dispatcher = Dispatcher::new(options.parallel)?;
    let discovery = discover(options, cancel)?;

    let pipeline = Pipeline::new(exec, cancel, &discovery.root, options.pipeline);
    let outcomes = dispatcher.run(
        &discovery.root,
        &discovery.repositories,
        cancel,
        progress,
        |path| pipeline.run(op, path),
    )?;

    let summary = Summary::from_outcomes(&outcomes);
    info!("{}: {}", op.name(), summary);
    Ok(BatchResult {
        root: discovery.root.clone(),
        total_discovered: discovery.discovered,
        total_processed: outcomes.len(),
        outcomes,
        duration: started.elapsed(),
        summary,
    })
}

fn validate_root(root: &Path) -> Result<PathBuf> {
    let invalid = |message: &str| Error::InvalidDirectory {
        path: root.to_path_buf(),
        message: message.to_string(),
    };
    let meta = fs::metadata(root).map_err(|e| invalid(&e.to_string()))?;
    if !meta.is_dir() {
        return Err(invalid("not a directory"));
    }
    fs::canonicalize(root).map_err(|e| invalid(&e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::mock::MockGit;
    use crate::ops::StatusOp;
    use crate::status::Status;
    use tempfile::TempDir;

    fn workspace(names: &[&str]) -> TempDir {
        let temp = TempDir::new().unwrap();
        for name in names {
            fs::create_dir_all(temp.path().join(name).join(".git")).unwrap();
        }
        temp
    }

    fn options(root: &Path) -> BulkOptions {
        BulkOptions {
            root: root.to_path_buf(),
            ..BulkOptions::default()
        }
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let mock = MockGit::new();
        let err = run(
            &options(Path::new("/definitely/not/here")),
            &StatusOp,
            &mock,
            &CancelToken::new(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidDirectory { .. }));
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_file_root_is_fatal() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("file.txt");
        fs::write(&file, "x").unwrap();
        let err = discover(&options(&file), &CancelToken::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidDirectory { ref message, .. } if message == "not a directory"));
    }

    #[test]
    fn test_bad_pattern_aborts_before_any_command() {
        let temp = workspace(&["a"]);
        let mock = MockGit::new();
        let opts = BulkOptions {
            exclude: Some("[".to_string()),
            ..options(temp.path())
        };
        let err = run(&opts, &StatusOp, &mock, &CancelToken::new(), None).unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { kind: "exclude", .. }));
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_zero_parallelism_is_fatal() {
        let temp = workspace(&["a"]);
        let opts = BulkOptions {
            parallel: 0,
            ..options(temp.path())
        };
        let err = run(&opts, &StatusOp, &MockGit::new(), &CancelToken::new(), None).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_every_selected_repository_gets_an_outcome() {
        let temp = workspace(&["api-one", "api-two", "web", "legacy/api-old"]);
        // Nothing scripted: every repository fails while loading info.
        let mock = MockGit::new();
        let opts = BulkOptions {
            include: Some("api-".to_string()),
            exclude: Some("^legacy/".to_string()),
            parallel: 2,
            ..options(temp.path())
        };
        let result = run(&opts, &StatusOp, &mock, &CancelToken::new(), None).unwrap();

        assert_eq!(result.total_discovered, 4);
        assert_eq!(result.total_processed, 2);
        assert_eq!(result.outcomes.len(), 2);
        assert!(result.outcomes.iter().all(|o| o.status == Status::Error));
        assert_eq!(result.summary.total(), result.outcomes.len());
        assert!(result.has_failures());
        let rel: Vec<_> = result
            .outcomes
            .iter()
            .map(|o| o.relative_path.to_string_lossy().into_owned())
            .collect();
        assert_eq!(rel, vec!["api-one", "api-two"]);
    }

    #[test]
    fn test_cancelled_before_start() {
        let temp = workspace(&["a"]);
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = run(&options(temp.path()), &StatusOp, &MockGit::new(), &cancel, None).unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }
}
