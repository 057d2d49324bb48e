//! # Error Handling
//!
//! This module defines the centralized error type for `repo-fleet`. It uses
//! `thiserror` to build an `Error` enum covering every failure the engine can
//! report, each variant carrying enough context to be useful on its own.
//!
//! Two tiers of errors flow through the crate:
//!
//! - **Configuration-level errors** (`InvalidDirectory`, `InvalidPattern`,
//!   `InvalidStrategy`, `InvalidConfig`, `ConfigParse`) abort a bulk call
//!   before any repository is touched.
//! - **Per-repository errors** (`NotARepository`, `GitCommand`, `GitSpawn`,
//!   `InvalidRefspec`, ...) are captured by the pipeline into that
//!   repository's outcome and never abort the batch.
//!
//! `Cancelled` is special: it aborts the dispatch as a whole.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Main error type for repo-fleet operations
#[derive(Error, Debug)]
pub enum Error {
    /// The scan root does not exist or is not a directory.
    #[error("Invalid directory {}: {message}", path.display())]
    InvalidDirectory { path: PathBuf, message: String },

    /// An include/exclude pattern failed to compile.
    #[error("Invalid {kind} pattern '{pattern}': {message}")]
    InvalidPattern {
        kind: &'static str,
        pattern: String,
        message: String,
    },

    /// A push refspec or a ref name failed validation.
    #[error("Invalid refspec '{spec}': {message}")]
    InvalidRefspec { spec: String, message: String },

    /// An unknown pull strategy was requested.
    #[error("Invalid pull strategy '{value}' (expected merge, rebase or ff-only)")]
    InvalidStrategy { value: String },

    /// A configuration value is out of range or inconsistent.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// An error occurred while parsing the configuration file.
    #[error("Configuration parsing error in {}: {message}", path.display())]
    ConfigParse { path: PathBuf, message: String },

    /// The path is not the root of a git repository.
    #[error("Not a git repository: {}", path.display())]
    NotARepository { path: PathBuf },

    /// A git command exited unsuccessfully.
    #[error("git {command} failed in {} (exit code {exit_code}): {stderr}", dir.display())]
    GitCommand {
        command: String,
        dir: PathBuf,
        exit_code: i32,
        stderr: String,
    },

    /// The git binary could not be started.
    #[error("Failed to run git {command}: {message}")]
    GitSpawn { command: String, message: String },

    /// The batch was cancelled.
    #[error("Operation cancelled")]
    Cancelled,

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether this error aborts a whole bulk call rather than a single
    /// repository.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::InvalidDirectory { .. }
                | Error::InvalidPattern { .. }
                | Error::InvalidStrategy { .. }
                | Error::InvalidConfig { .. }
                | Error::ConfigParse { .. }
                | Error::Regex(_)
                | Error::Cancelled
        )
    }
}

/// A non-fatal problem from a best-effort side action (stash pop, rebase
/// abort). It is logged and recorded on the outcome but never changes the
/// outcome's status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub action: &'static str,
    pub message: String,
}

impl Warning {
    pub fn new(action: &'static str, message: impl Into<String>) -> Self {
        Self {
            action,
            message: message.into(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.action, self.message)
    }
}
