//! # Git Command Execution
//!
//! All repository reads and mutations go through the [`GitExecutor`] trait:
//! run `git <args>` in a working directory and hand back stdout, stderr and
//! the exit code. The engine never touches object databases itself; it only
//! parses the line-oriented text git prints.
//!
//! [`SystemGit`] is the production implementation. It uses the system `git`
//! binary, which picks up SSH keys, credential helpers and everything else
//! configured in `~/.gitconfig`. Mutating commands run with
//! [`non_interactive_env`] so a credential prompt fails fast instead of
//! blocking the batch.
//!
//! [`Git`] binds an executor, a cancellation token and a repository directory
//! together so call sites read like `git.output(&["rev-parse", "HEAD"])`.

use std::env;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;

use log::debug;

use crate::cancel::CancelToken;
use crate::error::{Error, Result};

/// Captured result of one git invocation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    /// A successful result with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: 0,
        }
    }

    /// A failed result with the given exit code and stderr.
    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Trimmed stdout.
    pub fn text(&self) -> &str {
        self.stdout.trim()
    }

    /// stderr if it has content, stdout otherwise. Git prints some failures
    /// (merge conflicts, for one) on stdout.
    pub fn diagnostics(&self) -> &str {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim()
        } else {
            stderr
        }
    }
}

/// The command executor boundary.
///
/// `Err` is reserved for failures to run git at all (spawn errors,
/// cancellation). A command that ran and exited non-zero is an `Ok` with a
/// non-zero `exit_code`.
pub trait GitExecutor: Send + Sync {
    /// Run `git <args>` in `dir` with extra environment variables.
    fn run_with_env(
        &self,
        cancel: &CancelToken,
        dir: &Path,
        env: &[(String, String)],
        args: &[&str],
    ) -> Result<CommandOutput>;

    /// Run `git <args>` in `dir`.
    fn run(&self, cancel: &CancelToken, dir: &Path, args: &[&str]) -> Result<CommandOutput> {
        self.run_with_env(cancel, dir, &[], args)
    }
}

/// Environment for commands that may talk to a remote.
///
/// Disables every credential prompt git, the credential manager and ssh know
/// about, and pins the locale so [`is_auth_failure`] sees English messages.
/// An `GIT_SSH_COMMAND` the user already set is left alone.
pub fn non_interactive_env() -> Vec<(String, String)> {
    let mut vars = vec![
        ("GIT_TERMINAL_PROMPT".to_string(), "0".to_string()),
        ("GCM_INTERACTIVE".to_string(), "never".to_string()),
        ("LC_ALL".to_string(), "C".to_string()),
    ];
    if env::var_os("GIT_SSH_COMMAND").is_none() {
        vars.push((
            "GIT_SSH_COMMAND".to_string(),
            "ssh -o BatchMode=yes".to_string(),
        ));
    }
    vars
}

/// Lowercased fragments of git/ssh/credential-helper messages that mean the
/// remote rejected or could not obtain credentials.
pub const AUTH_FAILURE_PATTERNS: &[&str] = &[
    "authentication failed",
    "terminal prompts disabled",
    "http basic: access denied",
    "could not read username",
    "could not read password",
    "invalid username or password",
    "permission denied (publickey",
    "host key verification failed",
    "the requested url returned error: 401",
    "the requested url returned error: 403",
];

/// Whether a failed command's stderr indicates an authentication problem.
pub fn is_auth_failure(stderr: &str) -> bool {
    let stderr = stderr.to_lowercase();
    AUTH_FAILURE_PATTERNS
        .iter()
        .any(|pattern| stderr.contains(pattern))
}

/// The default [`GitExecutor`], backed by the system `git` binary.
///
/// The child process is polled so that a cancelled batch kills in-flight
/// commands instead of waiting for them.
#[derive(Debug, Clone)]
pub struct SystemGit {
    poll_interval: Duration,
}

impl SystemGit {
    pub fn new() -> Self {
        Self {
            poll_interval: Duration::from_millis(20),
        }
    }
}

impl Default for SystemGit {
    fn default() -> Self {
        Self::new()
    }
}

impl GitExecutor for SystemGit {
    fn run_with_env(
        &self,
        cancel: &CancelToken,
        dir: &Path,
        env: &[(String, String)],
        args: &[&str],
    ) -> Result<CommandOutput> {
        cancel.check()?;
        let command = args.first().copied().unwrap_or_default().to_string();
        debug!("git {} (in {})", args.join(" "), dir.display());

        let mut child = Command::new("git")
            .args(args)
            .current_dir(dir)
            .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::GitSpawn {
                command: command.clone(),
                message: e.to_string(),
            })?;

        // Drain both pipes on their own threads so a chatty command cannot
        // fill a pipe buffer and stall while we poll.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = loop {
            if cancel.is_cancelled() {
                kill(&mut child);
                return Err(Error::Cancelled);
            }
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => thread::sleep(self.poll_interval),
                Err(e) => {
                    kill(&mut child);
                    return Err(Error::GitSpawn {
                        command,
                        message: e.to_string(),
                    });
                }
            }
        };

        Ok(CommandOutput {
            stdout: stdout.join().unwrap_or_default(),
            stderr: stderr.join().unwrap_or_default(),
            // Killed by a signal: report the conventional shell code.
            exit_code: status.code().unwrap_or(128),
        })
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn kill(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

/// An executor, a cancellation token and a working directory, bound together.
#[derive(Clone, Copy)]
pub struct Git<'a> {
    exec: &'a dyn GitExecutor,
    cancel: &'a CancelToken,
    dir: &'a Path,
}

impl<'a> Git<'a> {
    pub fn new(exec: &'a dyn GitExecutor, cancel: &'a CancelToken, dir: &'a Path) -> Self {
        Self { exec, cancel, dir }
    }

    pub fn dir(&self) -> &'a Path {
        self.dir
    }

    pub fn cancel(&self) -> &'a CancelToken {
        self.cancel
    }

    /// Run a read-only command and return its raw output, whatever the
    /// exit code.
    pub fn run(&self, args: &[&str]) -> Result<CommandOutput> {
        self.exec.run(self.cancel, self.dir, args)
    }

    /// Run a command that may contact a remote or rewrite the repository,
    /// with credential prompting disabled.
    pub fn run_mutating(&self, args: &[&str]) -> Result<CommandOutput> {
        self.exec
            .run_with_env(self.cancel, self.dir, &non_interactive_env(), args)
    }

    /// Run a read-only command and return trimmed stdout, failing on a
    /// non-zero exit code.
    pub fn output(&self, args: &[&str]) -> Result<String> {
        let out = self.run(args)?;
        if out.success() {
            Ok(out.text().to_string())
        } else {
            Err(self.command_error(args, &out))
        }
    }

    /// Like [`Git::output`] but returns stdout untouched. Column-based
    /// formats such as `status --porcelain` need their leading spaces.
    pub fn output_raw(&self, args: &[&str]) -> Result<String> {
        let out = self.run(args)?;
        if out.success() {
            Ok(out.stdout)
        } else {
            Err(self.command_error(args, &out))
        }
    }

    /// Build the error for a command that exited unsuccessfully.
    pub fn command_error(&self, args: &[&str], out: &CommandOutput) -> Error {
        Error::GitCommand {
            command: args.join(" "),
            dir: self.dir.to_path_buf(),
            exit_code: out.exit_code,
            stderr: out.diagnostics().to_string(),
        }
    }
}
