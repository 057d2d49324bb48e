//! # Configuration File
//!
//! An optional YAML file supplying defaults for the bulk flags:
//!
//! ```yaml
//! max_depth: 3
//! parallel: 8
//! include: "^services/"
//! exclude: "-archive$"
//! include_submodules: false
//! ignore_dirty: false
//! pull_strategy: rebase
//! protected_branches: [main, release]
//! ```
//!
//! Every key is optional and unknown keys are rejected. Command-line flags
//! always win over values read here.
//!
//! ## Lookup order
//!
//! 1. An explicit path (`--config FILE` or `REPO_FLEET_CONFIG`); it must exist.
//! 2. `.repo-fleet.yaml` in the current directory.
//! 3. The user config file from [`default_config_path`].
//! 4. Built-in defaults.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::defaults::{
    default_config_path, DEFAULT_CONFIG_FILENAME, DEFAULT_MAX_DEPTH, DEFAULT_PARALLELISM,
    PROTECTED_BRANCHES,
};
use crate::error::{Error, Result};
use crate::filter::PatternFilter;
use crate::ops::PullStrategy;

/// Contents of a configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FleetConfig {
    #[serde(default)]
    pub max_depth: Option<usize>,
    #[serde(default)]
    pub parallel: Option<usize>,
    #[serde(default)]
    pub include: Option<String>,
    #[serde(default)]
    pub exclude: Option<String>,
    #[serde(default)]
    pub include_submodules: Option<bool>,
    #[serde(default)]
    pub ignore_dirty: Option<bool>,
    #[serde(default)]
    pub pull_strategy: Option<PullStrategy>,
    #[serde(default)]
    pub protected_branches: Option<Vec<String>>,
}

impl FleetConfig {
    /// Parse and validate YAML text. `path` is only used in error messages.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: FleetConfig =
            serde_yaml::from_str(content).map_err(|e| Error::ConfigParse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::parse(&content, path)
    }

    /// Load the first configuration file found, or the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        match locate(explicit, &cwd, default_config_path().as_deref())? {
            Some(path) => {
                debug!("loading configuration from {}", path.display());
                Self::from_file(&path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Reject values that could never work.
    pub fn validate(&self) -> Result<()> {
        if self.parallel == Some(0) {
            return Err(Error::InvalidConfig {
                message: "parallel must be at least 1".to_string(),
            });
        }
        if self.max_depth == Some(0) {
            return Err(Error::InvalidConfig {
                message: "max_depth must be at least 1".to_string(),
            });
        }
        PatternFilter::new(self.include.as_deref(), self.exclude.as_deref())?;
        Ok(())
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth.unwrap_or(DEFAULT_MAX_DEPTH)
    }

    pub fn parallel(&self) -> usize {
        self.parallel.unwrap_or(DEFAULT_PARALLELISM)
    }

    pub fn pull_strategy(&self) -> PullStrategy {
        self.pull_strategy.unwrap_or_default()
    }

    pub fn protected_branches(&self) -> Vec<String> {
        match &self.protected_branches {
            Some(names) => names.clone(),
            None => PROTECTED_BRANCHES.iter().map(|b| b.to_string()).collect(),
        }
    }
}

/// Pick the configuration file to read, if any.
pub fn locate(explicit: Option<&Path>, cwd: &Path, user: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(Error::ConfigParse {
                path: path.to_path_buf(),
                message: "file not found".to_string(),
            });
        }
        return Ok(Some(path.to_path_buf()));
    }
    let local = cwd.join(DEFAULT_CONFIG_FILENAME);
    if local.is_file() {
        return Ok(Some(local));
    }
    Ok(user.filter(|p| p.is_file()).map(Path::to_path_buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn parse(yaml: &str) -> Result<FleetConfig> {
        FleetConfig::parse(yaml, Path::new("test.yaml"))
    }

    #[test]
    fn test_parse_full_config() {
        let config = parse(
            r#"
max_depth: 3
parallel: 8
include: "^services/"
exclude: "-archive$"
include_submodules: true
ignore_dirty: false
pull_strategy: ff-only
protected_branches: [main, release]
"#,
        )
        .unwrap();
        assert_eq!(config.max_depth(), 3);
        assert_eq!(config.parallel(), 8);
        assert_eq!(config.include.as_deref(), Some("^services/"));
        assert_eq!(config.include_submodules, Some(true));
        assert_eq!(config.pull_strategy(), PullStrategy::FfOnly);
        assert_eq!(config.protected_branches(), vec!["main", "release"]);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config, FleetConfig::default());
        assert_eq!(config.max_depth(), DEFAULT_MAX_DEPTH);
        assert_eq!(config.parallel(), DEFAULT_PARALLELISM);
        assert_eq!(config.pull_strategy(), PullStrategy::Merge);
        assert!(config.protected_branches().contains(&"main".to_string()));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = parse("paralel: 4\n").unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));
    }

    #[test]
    fn test_unknown_strategy_is_rejected() {
        let err = parse("pull_strategy: squash\n").unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));
    }

    #[test]
    fn test_zero_parallel_is_invalid() {
        let err = parse("parallel: 0\n").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }

    #[test]
    fn test_bad_regex_is_invalid() {
        let err = parse("include: \"(\"\n").unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { kind: "include", .. }));
    }

    #[test]
    fn test_locate_prefers_explicit_then_local_then_user() {
        let temp = TempDir::new().unwrap();
        let explicit = temp.path().join("explicit.yaml");
        let user = temp.path().join("user.yaml");
        fs::write(&explicit, "").unwrap();
        fs::write(&user, "").unwrap();

        let found = locate(Some(explicit.as_path()), temp.path(), Some(user.as_path())).unwrap();
        assert_eq!(found, Some(explicit));

        assert_eq!(locate(None, temp.path(), Some(user.as_path())).unwrap(), Some(user.clone()));

        let local = temp.path().join(DEFAULT_CONFIG_FILENAME);
        fs::write(&local, "").unwrap();
        assert_eq!(locate(None, temp.path(), Some(user.as_path())).unwrap(), Some(local));
    }

    #[test]
    fn test_locate_missing_explicit_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let err = locate(Some(temp.path().join("nope.yaml").as_path()), temp.path(), None).unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));
    }

    #[test]
    fn test_locate_nothing_found() {
        let temp = TempDir::new().unwrap();
        let user = temp.path().join("missing.yaml");
        assert_eq!(locate(None, temp.path(), Some(user.as_path())).unwrap(), None);
    }

    #[test]
    #[serial]
    fn test_load_reads_local_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(DEFAULT_CONFIG_FILENAME), "parallel: 3\n").unwrap();
        let previous = std::env::current_dir().unwrap();
        std::env::set_current_dir(temp.path()).unwrap();
        let config = FleetConfig::load(None);
        std::env::set_current_dir(previous).unwrap();
        assert_eq!(config.unwrap().parallel(), 3);
    }
}
