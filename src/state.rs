//! # Repository State Classification
//!
//! Computes a read-only [`RepositoryState`] snapshot: in-progress rebase or
//! merge (from marker paths in the metadata directory, no command needed)
//! and dirty/conflict facts parsed from `git status --porcelain`.
//!
//! A snapshot is never cached. The pipeline classifies again whenever it
//! needs to know what a command did to the working tree.

use crate::error::Result;
use crate::git::Git;
use crate::repository::RepositoryHandle;

/// Marker paths that mean a rebase is stopped mid-way.
const REBASE_MARKERS: &[&str] = &["rebase-merge", "rebase-apply"];

/// Marker path that means a merge is waiting for a commit.
const MERGE_MARKER: &str = "MERGE_HEAD";

/// A point-in-time view of a repository's working tree health.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryState {
    /// Conflicted paths, verbatim from the status report.
    pub conflict_files: Vec<String>,
    pub rebase_in_progress: bool,
    pub merge_in_progress: bool,
    /// Entries with a change in the index column.
    pub staged: usize,
    /// Entries with a change in the worktree column.
    pub unstaged: usize,
    pub untracked: usize,
    /// Non-conflict entries of any kind.
    pub uncommitted: usize,
}

impl RepositoryState {
    pub fn is_clean(&self) -> bool {
        self.uncommitted == 0 && self.conflict_files.is_empty()
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflict_files.is_empty()
    }

    /// Tracked changes only; untracked files do not block a rebase.
    pub fn has_tracked_changes(&self) -> bool {
        self.staged > 0 || self.unstaged > 0
    }
}

/// Classify the repository behind `handle`. Never mutates it.
pub fn classify(handle: &RepositoryHandle, git: &Git<'_>) -> Result<RepositoryState> {
    let mut state = if handle.is_bare {
        RepositoryState::default()
    } else {
        parse_porcelain(&git.output_raw(&["status", "--porcelain"])?)
    };
    state.rebase_in_progress = REBASE_MARKERS.iter().any(|m| handle.has_marker(m));
    state.merge_in_progress = handle.has_marker(MERGE_MARKER);
    Ok(state)
}

/// Parse short-status lines: two status characters (index, worktree), a
/// space, then the path.
pub fn parse_porcelain(output: &str) -> RepositoryState {
    let mut state = RepositoryState::default();

    for line in output.lines() {
        let mut chars = line.chars();
        let (Some(index), Some(worktree)) = (chars.next(), chars.next()) else {
            continue;
        };
        // Both status columns are ASCII, so the path starts at byte 3.
        let path = line.get(3..).unwrap_or_default();

        if is_conflict(index, worktree) {
            state.conflict_files.push(path.to_string());
            continue;
        }
        if index == ' ' && worktree == ' ' {
            continue;
        }

        state.uncommitted += 1;
        if index == '?' {
            state.untracked += 1;
            continue;
        }
        if index != ' ' {
            state.staged += 1;
        }
        if worktree != ' ' {
            state.unstaged += 1;
        }
    }
    state
}

fn is_conflict(index: char, worktree: char) -> bool {
    index == 'U' || worktree == 'U' || matches!((index, worktree), ('A', 'A') | ('D', 'D'))
}
