//! # Repository Handles and Info
//!
//! [`RepositoryHandle`] is the opened, validated reference to one repository
//! root. Opening only looks at the filesystem: a `.git` directory marks an
//! independent repository, a `.git` file (a `gitdir:` pointer into a parent
//! repository's store) marks a submodule or linked worktree, and a directory
//! holding `HEAD`, `objects/` and `refs/` is a bare repository.
//!
//! [`RepositoryInfo`] holds the branch/remote/upstream facts of a repository
//! and is recomputed on every pipeline run.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use url::Url;

use crate::error::{Error, Result};
use crate::git::Git;

/// How a directory's git metadata is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataKind {
    /// `.git` is a directory: an independent repository.
    Directory,
    /// `.git` is a file pointing elsewhere: a submodule (or linked worktree).
    File,
}

/// Inspect `dir/.git` without following the pointer.
pub fn metadata_kind(dir: &Path) -> Option<MetadataKind> {
    let entry = dir.join(".git");
    let meta = fs::symlink_metadata(&entry).ok()?;
    if meta.is_dir() {
        Some(MetadataKind::Directory)
    } else if meta.is_file() {
        Some(MetadataKind::File)
    } else if meta.file_type().is_symlink() {
        // A symlinked .git is treated like whatever it points at.
        match fs::metadata(&entry) {
            Ok(target) if target.is_dir() => Some(MetadataKind::Directory),
            Ok(target) if target.is_file() => Some(MetadataKind::File),
            _ => None,
        }
    } else {
        None
    }
}

/// An opened repository root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryHandle {
    /// Absolute path of the repository root.
    pub path: PathBuf,
    /// The directory holding git's metadata (HEAD, refs, markers).
    pub git_dir: PathBuf,
    /// The working tree, `None` for bare repositories.
    pub work_tree: Option<PathBuf>,
    pub is_bare: bool,
    pub is_shallow: bool,
    /// `.git` was a pointer file rather than a directory.
    pub is_submodule: bool,
}

impl RepositoryHandle {
    /// Resolve and validate the repository rooted at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let path = fs::canonicalize(path).map_err(|_| Error::NotARepository {
            path: path.to_path_buf(),
        })?;

        let (git_dir, work_tree, is_bare, is_submodule) = match metadata_kind(&path) {
            Some(MetadataKind::Directory) => (path.join(".git"), Some(path.clone()), false, false),
            Some(MetadataKind::File) => {
                let git_dir = read_gitdir_pointer(&path)?;
                (git_dir, Some(path.clone()), false, true)
            }
            None if is_bare_layout(&path) => (path.clone(), None, true, false),
            None => return Err(Error::NotARepository { path }),
        };

        let is_shallow = git_dir.join("shallow").is_file();
        Ok(Self {
            path,
            git_dir,
            work_tree,
            is_bare,
            is_shallow,
            is_submodule,
        })
    }

    /// Whether `name` exists inside the metadata directory.
    pub fn has_marker(&self, name: &str) -> bool {
        self.git_dir.join(name).exists()
    }
}

/// Resolve `gitdir: <path>` from a `.git` file, relative to the repository.
fn read_gitdir_pointer(repo: &Path) -> Result<PathBuf> {
    let content = fs::read_to_string(repo.join(".git"))?;
    let target = content
        .lines()
        .find_map(|line| line.strip_prefix("gitdir:"))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| Error::NotARepository {
            path: repo.to_path_buf(),
        })?;
    let target = Path::new(target);
    Ok(if target.is_absolute() {
        target.to_path_buf()
    } else {
        repo.join(target)
    })
}

fn is_bare_layout(dir: &Path) -> bool {
    dir.join("HEAD").is_file() && dir.join("objects").is_dir() && dir.join("refs").is_dir()
}

/// Branch, remote and upstream facts for one repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryInfo {
    /// Current branch, empty when HEAD is detached.
    pub branch: String,
    /// Name of the default remote (`origin` if configured, else the first).
    pub remote: Option<String>,
    /// All configured remotes, name to (credential-redacted) fetch URL.
    pub remotes: BTreeMap<String, String>,
    /// Upstream ref such as `origin/main`, empty when none is configured.
    pub upstream: String,
    /// Commits only on the local branch. Meaningless without an upstream.
    pub ahead: usize,
    /// Commits only on the upstream. Meaningless without an upstream.
    pub behind: usize,
}

impl RepositoryInfo {
    pub fn load(git: &Git<'_>) -> Result<Self> {
        let head = git.run(&["symbolic-ref", "--short", "-q", "HEAD"])?;
        let branch = if head.success() {
            head.text().to_string()
        } else {
            String::new()
        };

        let remotes = parse_remotes(&git.output(&["remote", "-v"])?);
        let remote = if remotes.contains_key("origin") {
            Some("origin".to_string())
        } else {
            remotes.keys().next().cloned()
        };

        let mut info = Self {
            branch,
            remote,
            remotes,
            ..Self::default()
        };

        if info.branch.is_empty() {
            return Ok(info);
        }

        let upstream = git.run(&["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{u}"])?;
        if upstream.success() {
            info.upstream = upstream.text().to_string();
        }
        if info.has_upstream() {
            let counts = git.output(&["rev-list", "--left-right", "--count", "HEAD...@{u}"])?;
            let (ahead, behind) = parse_ahead_behind(&counts).ok_or_else(|| Error::GitCommand {
                command: "rev-list --left-right --count".to_string(),
                dir: git.dir().to_path_buf(),
                exit_code: 0,
                stderr: format!("unexpected output '{}'", counts),
            })?;
            info.ahead = ahead;
            info.behind = behind;
        }
        Ok(info)
    }

    pub fn has_remote(&self) -> bool {
        !self.remotes.is_empty()
    }

    pub fn has_upstream(&self) -> bool {
        !self.upstream.is_empty()
    }

    pub fn is_detached(&self) -> bool {
        self.branch.is_empty()
    }

    /// Ahead/behind counts, only when an upstream exists.
    pub fn ahead_behind(&self) -> Option<(usize, usize)> {
        self.has_upstream().then_some((self.ahead, self.behind))
    }

    /// The remote part of the upstream (`origin` in `origin/feature/x`).
    ///
    /// Remote names may contain slashes, so the longest configured remote
    /// that prefixes the upstream wins.
    pub fn upstream_remote(&self) -> Option<&str> {
        self.remotes
            .keys()
            .filter(|name| {
                self.upstream
                    .strip_prefix(name.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
            })
            .max_by_key(|name| name.len())
            .map(String::as_str)
    }

    /// The branch part of the upstream (`feature/x` in `origin/feature/x`).
    pub fn upstream_branch(&self) -> Option<&str> {
        let remote = self.upstream_remote()?;
        self.upstream.get(remote.len() + 1..)
    }
}

/// Parse `git remote -v` into name → fetch URL.
pub fn parse_remotes(output: &str) -> BTreeMap<String, String> {
    let mut remotes = BTreeMap::new();
    for line in output.lines() {
        let mut parts = line.split_whitespace();
        let (Some(name), Some(url)) = (parts.next(), parts.next()) else {
            continue;
        };
        if parts.next() == Some("(push)") && remotes.contains_key(name) {
            continue;
        }
        remotes.insert(name.to_string(), redact_url(url));
    }
    remotes
}

/// Parse `rev-list --left-right --count` output (`<ahead>\t<behind>`).
pub fn parse_ahead_behind(output: &str) -> Option<(usize, usize)> {
    let mut parts = output.split_whitespace();
    let ahead = parts.next()?.parse().ok()?;
    let behind = parts.next()?.parse().ok()?;
    Some((ahead, behind))
}

/// Strip embedded credentials from a remote URL. scp-style addresses
/// (`git@host:path`) are not URLs and pass through unchanged.
pub fn redact_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) if !url.username().is_empty() || url.password().is_some() => {
            let _ = url.set_username("");
            let _ = url.set_password(None);
            url.to_string()
        }
        _ => raw.to_string(),
    }
}
