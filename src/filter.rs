//! # Include/Exclude Filtering
//!
//! Narrows the scanned repository set with optional regular expressions,
//! matched against each repository's path relative to the scan root (`.` for
//! the root itself, `/` as separator on every platform). Exclude wins over
//! include.

use std::path::{Path, PathBuf};

use regex::Regex;

use crate::error::{Error, Result};

/// Compiled include/exclude patterns.
#[derive(Debug, Clone, Default)]
pub struct PatternFilter {
    include: Option<Regex>,
    exclude: Option<Regex>,
}

impl PatternFilter {
    /// Compile the patterns. A pattern that does not compile is a
    /// configuration error for the whole call.
    pub fn new(include: Option<&str>, exclude: Option<&str>) -> Result<Self> {
        Ok(Self {
            include: include.map(|p| compile("include", p)).transpose()?,
            exclude: exclude.map(|p| compile("exclude", p)).transpose()?,
        })
    }

    /// True when no pattern was given.
    pub fn is_passthrough(&self) -> bool {
        self.include.is_none() && self.exclude.is_none()
    }

    pub fn matches(&self, candidate: &str) -> bool {
        if self.exclude.as_ref().is_some_and(|re| re.is_match(candidate)) {
            return false;
        }
        self.include.as_ref().map_or(true, |re| re.is_match(candidate))
    }

    /// Keep the paths under `root` whose relative form matches.
    pub fn apply(&self, root: &Path, paths: Vec<PathBuf>) -> Vec<PathBuf> {
        if self.is_passthrough() {
            return paths;
        }
        paths
            .into_iter()
            .filter(|path| self.matches(&relative_display(root, path)))
            .collect()
    }
}

/// Filter `paths` in one call.
pub fn filter(
    root: &Path,
    paths: Vec<PathBuf>,
    include: Option<&str>,
    exclude: Option<&str>,
) -> Result<Vec<PathBuf>> {
    Ok(PatternFilter::new(include, exclude)?.apply(root, paths))
}

/// `path` relative to `root`, with `/` separators; `.` for the root.
pub fn relative_display(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let parts: Vec<_> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

fn compile(kind: &'static str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::InvalidPattern {
        kind,
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(root: &Path, rels: &[&str]) -> Vec<PathBuf> {
        rels.iter().map(|r| root.join(r)).collect()
    }

    #[test]
    fn test_no_patterns_is_passthrough() {
        let root = Path::new("/work");
        let input = paths(root, &["a", "b"]);
        let out = filter(root, input.clone(), None, None).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn test_include_only() {
        let root = Path::new("/work");
        let out = filter(
            root,
            paths(root, &["api-server", "web", "api-client"]),
            Some("^api-"),
            None,
        )
        .unwrap();
        assert_eq!(out, paths(root, &["api-server", "api-client"]));
    }

    #[test]
    fn test_exclude_wins_over_include() {
        let root = Path::new("/work");
        let out = filter(
            root,
            paths(root, &["api-server", "api-legacy", "web"]),
            Some("^api-"),
            Some("legacy"),
        )
        .unwrap();
        assert_eq!(out, paths(root, &["api-server"]));
    }

    #[test]
    fn test_matches_nested_relative_path() {
        let root = Path::new("/work");
        let out = filter(
            root,
            paths(root, &["team/one", "other/two"]),
            Some("^team/"),
            None,
        )
        .unwrap();
        assert_eq!(out, paths(root, &["team/one"]));
    }

    #[test]
    fn test_invalid_regex_is_error() {
        let err = PatternFilter::new(Some("(unclosed"), None).unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { kind: "include", .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_relative_display_root() {
        assert_eq!(relative_display(Path::new("/w"), Path::new("/w")), ".");
        assert_eq!(relative_display(Path::new("/w"), Path::new("/w/a/b")), "a/b");
    }
}
