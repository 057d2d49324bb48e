//! # Repository Discovery
//!
//! Walks a directory tree and returns the roots of every git repository in
//! it, sorted by path so downstream indexing is deterministic.
//!
//! ## Rules
//!
//! - The scan root is depth 0; nothing deeper than `max_depth` is visited.
//! - Hidden directories and common build/output directories
//!   ([`SKIPPED_DIRS`](crate::defaults::SKIPPED_DIRS)) are never entered.
//! - Independent repositories (`.git` directory) are recorded and descended
//!   into, since they may hold further independent repositories.
//! - Submodules (`.git` file) are only walked when `include_submodules` is
//!   set. Without it, a submodule inside a recorded parent repository is
//!   left to that parent and omitted entirely. A `.git`-file directory with
//!   no recorded parent (the scan root, a linked worktree, a submodule whose
//!   parent lies outside the scan) is recorded but not descended into.
//! - Unreadable directories are logged at debug level and skipped.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use log::debug;
use walkdir::WalkDir;

use crate::cancel::CancelToken;
use crate::defaults::{DEFAULT_MAX_DEPTH, SKIPPED_DIRS};
use crate::error::Result;
use crate::repository::{metadata_kind, MetadataKind};

/// Scanner settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    pub max_depth: usize,
    pub include_submodules: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            include_submodules: false,
        }
    }
}

/// A discovered repository root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRecord {
    pub path: PathBuf,
    /// Directory hops from the scan root.
    pub depth: usize,
    pub kind: MetadataKind,
}

/// Discover repository roots under `root`, sorted by path.
pub fn scan(root: &Path, options: ScanOptions, cancel: &CancelToken) -> Result<Vec<PathBuf>> {
    Ok(scan_records(root, options, cancel)?
        .into_iter()
        .map(|record| record.path)
        .collect())
}

/// Like [`scan`], keeping the depth and metadata kind of each repository.
pub fn scan_records(
    root: &Path,
    options: ScanOptions,
    cancel: &CancelToken,
) -> Result<Vec<ScanRecord>> {
    let mut records = Vec::new();
    // Depths of recorded repositories on the path to the current entry.
    let mut repo_ancestors: Vec<usize> = Vec::new();

    let mut walker = WalkDir::new(root)
        .follow_links(false)
        .max_depth(options.max_depth)
        .sort_by_file_name()
        .into_iter();

    while let Some(entry) = walker.next() {
        cancel.check()?;

        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                debug!(
                    "skipping unreadable path {}: {}",
                    err.path().unwrap_or(root).display(),
                    err
                );
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }

        let depth = entry.depth();
        if depth > 0 && is_skipped(entry.file_name()) {
            walker.skip_current_dir();
            continue;
        }
        while repo_ancestors.last().is_some_and(|&d| d >= depth) {
            repo_ancestors.pop();
        }

        match metadata_kind(entry.path()) {
            Some(MetadataKind::Directory) => {
                records.push(record(entry.path(), depth, MetadataKind::Directory));
                repo_ancestors.push(depth);
            }
            Some(MetadataKind::File) if options.include_submodules => {
                records.push(record(entry.path(), depth, MetadataKind::File));
                repo_ancestors.push(depth);
            }
            Some(MetadataKind::File) => {
                if repo_ancestors.is_empty() {
                    records.push(record(entry.path(), depth, MetadataKind::File));
                }
                walker.skip_current_dir();
            }
            None => {}
        }
    }

    records.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(records)
}

fn record(path: &Path, depth: usize, kind: MetadataKind) -> ScanRecord {
    ScanRecord {
        path: path.to_path_buf(),
        depth,
        kind,
    }
}

fn is_skipped(name: &OsStr) -> bool {
    let name = name.to_string_lossy();
    name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref())
}
