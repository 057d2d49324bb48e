//! # Outcome Status Taxonomy
//!
//! Every repository in a batch ends in exactly one [`Status`]. The set is
//! closed, and [`Status::category`] maps each status to its
//! [`Category`] exhaustively, so adding a status without deciding how it is
//! reported fails to compile.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The terminal status of one repository in a bulk operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    // Success
    UpToDate,
    Fetched,
    Pulled,
    Pushed,
    Cloned,
    Switched,
    BranchCreated,
    CleanedUp,
    Stashed,
    Popped,
    TagCreated,
    TagPushed,
    // Skip
    NoRemote,
    NoUpstream,
    AlreadyOnBranch,
    NothingToPush,
    NoChanges,
    NoStash,
    NoTags,
    Skipped,
    // Conflict / lock
    Conflict,
    RebaseInProgress,
    MergeInProgress,
    Dirty,
    BranchNotFound,
    // Failure
    Error,
    AuthRequired,
    // Dry-run previews
    WouldFetch,
    WouldPull,
    WouldPush,
    WouldClone,
    WouldSwitch,
    WouldCreate,
    WouldCleanup,
    WouldStash,
    WouldPop,
    WouldCreateTag,
    WouldPushTags,
}

/// How a status is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Success,
    Skip,
    Conflict,
    Failure,
    DryRun,
}

impl Status {
    pub fn category(self) -> Category {
        use Status::*;
        match self {
            UpToDate | Fetched | Pulled | Pushed | Cloned | Switched | BranchCreated
            | CleanedUp | Stashed | Popped | TagCreated | TagPushed => Category::Success,
            NoRemote | NoUpstream | AlreadyOnBranch | NothingToPush | NoChanges | NoStash
            | NoTags | Skipped => Category::Skip,
            Conflict | RebaseInProgress | MergeInProgress | Dirty | BranchNotFound => {
                Category::Conflict
            }
            Error | AuthRequired => Category::Failure,
            WouldFetch | WouldPull | WouldPush | WouldClone | WouldSwitch | WouldCreate
            | WouldCleanup | WouldStash | WouldPop | WouldCreateTag | WouldPushTags => {
                Category::DryRun
            }
        }
    }

    /// The kebab-case name used in output and JSON.
    pub fn as_str(self) -> &'static str {
        use Status::*;
        match self {
            UpToDate => "up-to-date",
            Fetched => "fetched",
            Pulled => "pulled",
            Pushed => "pushed",
            Cloned => "cloned",
            Switched => "switched",
            BranchCreated => "branch-created",
            CleanedUp => "cleaned-up",
            Stashed => "stashed",
            Popped => "popped",
            TagCreated => "tag-created",
            TagPushed => "tag-pushed",
            NoRemote => "no-remote",
            NoUpstream => "no-upstream",
            AlreadyOnBranch => "already-on-branch",
            NothingToPush => "nothing-to-push",
            NoChanges => "no-changes",
            NoStash => "no-stash",
            NoTags => "no-tags",
            Skipped => "skipped",
            Conflict => "conflict",
            RebaseInProgress => "rebase-in-progress",
            MergeInProgress => "merge-in-progress",
            Dirty => "dirty",
            BranchNotFound => "branch-not-found",
            Error => "error",
            AuthRequired => "auth-required",
            WouldFetch => "would-fetch",
            WouldPull => "would-pull",
            WouldPush => "would-push",
            WouldClone => "would-clone",
            WouldSwitch => "would-switch",
            WouldCreate => "would-create",
            WouldCleanup => "would-cleanup",
            WouldStash => "would-stash",
            WouldPop => "would-pop",
            WouldCreateTag => "would-create-tag",
            WouldPushTags => "would-push-tags",
        }
    }

    pub fn is_failure(self) -> bool {
        self.category() == Category::Failure
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
