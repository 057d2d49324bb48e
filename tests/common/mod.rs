//! Shared test utilities for integration and E2E tests.
//!
//! Builds small fleets of real git repositories in a temporary directory:
//! bare "remotes" live under `remotes/`, a scratch clone used to publish
//! upstream commits lives under `seed/`, and the repositories under test
//! live under `fleet/`, which is the directory the tests scan.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     if !git_available() {
//!         return;
//!     }
//!     let ws = Workspace::new();
//!     let remote = ws.remote("api");
//!     let repo = ws.clone_into_fleet(&remote, "api");
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_fs::prelude::*;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::{commit_file, git, git_available, head, Workspace};
}

/// True when `git --version` runs. Tests that need git return early
/// without it.
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .is_ok_and(|out| out.status.success())
}

/// Run git in `dir` and return trimmed stdout. Panics on failure.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let out = Command::new("git")
        .args([
            "-c",
            "user.name=Fleet Test",
            "-c",
            "user.email=fleet@example.com",
            "-c",
            "commit.gpgsign=false",
            "-c",
            "init.defaultBranch=main",
            "-c",
            "protocol.file.allow=always",
        ])
        .args(args)
        .current_dir(dir)
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()
        .expect("failed to run git");
    assert!(
        out.status.success(),
        "git {:?} failed in {}: {}",
        args,
        dir.display(),
        String::from_utf8_lossy(&out.stderr)
    );
    String::from_utf8_lossy(&out.stdout).trim().to_string()
}

/// Write `file` and commit it.
pub fn commit_file(dir: &Path, file: &str, content: &str, message: &str) {
    let path = dir.join(file);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("failed to create parent directory");
    }
    fs::write(&path, content).expect("failed to write file");
    git(dir, &["add", file]);
    git(dir, &["commit", "-q", "-m", message]);
}

/// Current HEAD commit of `dir`.
pub fn head(dir: &Path) -> String {
    git(dir, &["rev-parse", "HEAD"])
}

/// Identity for commands run by the tool itself (stash, merge commits, tags).
fn configure_identity(dir: &Path) {
    git(dir, &["config", "user.name", "Fleet Test"]);
    git(dir, &["config", "user.email", "fleet@example.com"]);
    git(dir, &["config", "commit.gpgsign", "false"]);
    git(dir, &["config", "tag.gpgsign", "false"]);
}

/// A temporary directory holding remotes, a seed clone and the fleet.
pub struct Workspace {
    temp: assert_fs::TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let temp = assert_fs::TempDir::new().expect("Failed to create temp directory");
        temp.child("remotes").create_dir_all().expect("remotes dir");
        temp.child("seed").create_dir_all().expect("seed dir");
        temp.child("fleet").create_dir_all().expect("fleet dir");
        Self { temp }
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// The directory the tests scan.
    pub fn fleet(&self) -> PathBuf {
        self.temp.path().join("fleet")
    }

    /// A bare remote `remotes/<name>.git` whose `main` holds one commit
    /// adding `README.md`. The seed clone at `seed/<name>` can publish more.
    pub fn remote(&self, name: &str) -> PathBuf {
        let bare = self.temp.path().join("remotes").join(format!("{}.git", name));
        git(self.path(), &["init", "-q", "--bare", bare.to_str().expect("utf-8 path")]);
        git(&bare, &["symbolic-ref", "HEAD", "refs/heads/main"]);

        let seed = self.seed(name);
        fs::create_dir_all(&seed).expect("seed clone dir");
        git(&seed, &["init", "-q"]);
        configure_identity(&seed);
        commit_file(&seed, "README.md", "# readme\n", "initial commit");
        git(&seed, &["branch", "-M", "main"]);
        git(&seed, &["remote", "add", "origin", bare.to_str().expect("utf-8 path")]);
        git(&seed, &["push", "-q", "-u", "origin", "main"]);
        bare
    }

    /// The scratch clone that publishes upstream commits for `name`.
    pub fn seed(&self, name: &str) -> PathBuf {
        self.temp.path().join("seed").join(name)
    }

    /// Commit `count` new files in the seed clone and push them.
    pub fn publish(&self, name: &str, count: usize) {
        let seed = self.seed(name);
        for i in 0..count {
            commit_file(
                &seed,
                &format!("upstream-{}.txt", i),
                &format!("change {}\n", i),
                &format!("upstream change {}", i),
            );
        }
        git(&seed, &["push", "-q", "origin", "main"]);
    }

    /// Clone `remote` to `fleet/<rel>`.
    pub fn clone_into_fleet(&self, remote: &Path, rel: &str) -> PathBuf {
        let target = self.fleet().join(rel);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).expect("clone parent");
        }
        git(
            self.path(),
            &[
                "clone",
                "-q",
                remote.to_str().expect("utf-8 path"),
                target.to_str().expect("utf-8 path"),
            ],
        );
        configure_identity(&target);
        target
    }

    /// A repository without any remote at `fleet/<rel>`, with one commit.
    pub fn local_repo(&self, rel: &str) -> PathBuf {
        let dir = self.fleet().join(rel);
        fs::create_dir_all(&dir).expect("repo dir");
        git(&dir, &["init", "-q"]);
        configure_identity(&dir);
        commit_file(&dir, "README.md", "# local\n", "initial commit");
        git(&dir, &["branch", "-M", "main"]);
        dir
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_layout() {
        let ws = Workspace::new();
        assert!(ws.fleet().is_dir());
        assert!(ws.path().join("remotes").is_dir());
    }
}
