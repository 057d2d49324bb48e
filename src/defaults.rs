//! Default values for repo-fleet configuration.
//!
//! Every default the engine and the CLI rely on lives here, so commands and
//! library entry points cannot drift apart.

use std::path::PathBuf;

/// How many directory levels below the scan root are searched.
///
/// The root itself is depth 0, so `1` means "immediate children only".
pub const DEFAULT_MAX_DEPTH: usize = 5;

/// How many repositories are processed at the same time.
pub const DEFAULT_PARALLELISM: usize = 10;

/// Name of the per-directory configuration file.
pub const DEFAULT_CONFIG_FILENAME: &str = ".repo-fleet.yaml";

/// Environment variable pointing at a configuration file.
pub const CONFIG_ENV_VAR: &str = "REPO_FLEET_CONFIG";

/// Label prefix for stashes created on behalf of a pull.
pub const STASH_LABEL: &str = "repo-fleet auto-stash";

/// Directory names that are never descended into while scanning.
///
/// Hidden directories are skipped separately by their leading dot.
pub const SKIPPED_DIRS: &[&str] = &[
    "node_modules",
    "vendor",
    "target",
    "build",
    "dist",
    "__pycache__",
    ".cache",
    ".tmp",
];

/// Branches `cleanup` never deletes.
pub const PROTECTED_BRANCHES: &[&str] = &["main", "master", "develop"];

/// Returns the default location of the user-level configuration file.
///
/// - Linux: `~/.config/repo-fleet/config.yaml`
/// - macOS: `~/Library/Application Support/repo-fleet/config.yaml`
/// - Windows: `{FOLDERID_RoamingAppData}\repo-fleet\config.yaml`
///
/// Returns `None` when the platform config directory cannot be determined.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("repo-fleet").join("config.yaml"))
}
