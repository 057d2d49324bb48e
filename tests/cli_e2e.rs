//! End-to-end tests for the `repo-fleet` binary.
//!
//! Exit codes: 0 when no repository failed, 1 when one did or the command
//! could not run, 2 for invalid usage (handled by clap).

mod common;
use common::prelude::*;

#[test]
fn test_help_lists_subcommands() {
    let mut cmd = cargo_bin_cmd!("repo-fleet");
    cmd.arg("--help")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("pull"))
        .stdout(predicate::str::contains("push"))
        .stdout(predicate::str::contains("cleanup"))
        .stdout(predicate::str::contains("completions"));
}

#[test]
fn test_version() {
    let mut cmd = cargo_bin_cmd!("repo-fleet");
    cmd.arg("--version").assert().code(0);
}

#[test]
fn test_unknown_flag_is_usage_error() {
    let mut cmd = cargo_bin_cmd!("repo-fleet");
    cmd.args(["status", "--no-such-flag"]).assert().code(2);
}

#[test]
fn test_missing_directory_exits_one_with_hint() {
    let temp = assert_fs::TempDir::new().unwrap();
    let mut cmd = cargo_bin_cmd!("repo-fleet");
    cmd.current_dir(temp.path())
        .args(["status", "does-not-exist"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Cannot scan"))
        .stderr(predicate::str::contains("hint:"));
}

#[test]
fn test_invalid_pattern_exits_one_with_hint() {
    let temp = assert_fs::TempDir::new().unwrap();
    let mut cmd = cargo_bin_cmd!("repo-fleet");
    cmd.current_dir(temp.path())
        .args(["scan", "--include", "(unclosed"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid --include pattern"));
}

#[test]
fn test_unknown_strategy_suggests_fix() {
    let temp = assert_fs::TempDir::new().unwrap();
    let mut cmd = cargo_bin_cmd!("repo-fleet");
    cmd.current_dir(temp.path())
        .args(["pull", "--strategy", "rebse"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Did you mean 'rebase'?"));
}

#[test]
fn test_zero_parallelism_is_rejected() {
    let temp = assert_fs::TempDir::new().unwrap();
    let mut cmd = cargo_bin_cmd!("repo-fleet");
    cmd.current_dir(temp.path())
        .args(["status", "-j", "0"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("parallelism"));
}

#[test]
fn test_config_file_with_unknown_key() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child(".repo-fleet.yaml").write_str("paralel: 2\n").unwrap();
    let mut cmd = cargo_bin_cmd!("repo-fleet");
    cmd.current_dir(temp.path())
        .env_remove("REPO_FLEET_CONFIG")
        .arg("scan")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("paralel"));
}

#[test]
fn test_scan_lists_repositories() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("api/.git").create_dir_all().unwrap();
    temp.child("web/.git").create_dir_all().unwrap();
    temp.child("node_modules/dep/.git").create_dir_all().unwrap();

    let mut cmd = cargo_bin_cmd!("repo-fleet");
    cmd.current_dir(temp.path())
        .env_remove("REPO_FLEET_CONFIG")
        .args(["scan", "--color", "never", "--exclude", "^web$"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("- api"))
        .stdout(predicate::str::contains("- web").not())
        .stdout(predicate::str::contains("node_modules").not())
        .stdout(predicate::str::contains("1 of 2 repositories selected"));
}

#[test]
fn test_scan_json() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("api/.git").create_dir_all().unwrap();

    let mut cmd = cargo_bin_cmd!("repo-fleet");
    let assert = cmd
        .current_dir(temp.path())
        .env_remove("REPO_FLEET_CONFIG")
        .args(["scan", "--format", "json"])
        .assert()
        .code(0);
    let json: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(json["total_discovered"], 1);
    assert_eq!(json["repositories"][0], "api");
}

#[test]
fn test_status_over_real_repositories() {
    if !git_available() {
        return;
    }
    let ws = Workspace::new();
    let remote = ws.remote("api");
    ws.clone_into_fleet(&remote, "api");
    ws.local_repo("scratch");

    let mut cmd = cargo_bin_cmd!("repo-fleet");
    cmd.current_dir(ws.path())
        .env_remove("REPO_FLEET_CONFIG")
        .args(["status", "fleet", "--color", "never"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("[ok] api up-to-date [main]"))
        .stdout(predicate::str::contains("[skip] scratch no-remote"))
        .stdout(predicate::str::contains("2 of 2 repositories processed"));
}

#[test]
fn test_failed_push_exits_one() {
    if !git_available() {
        return;
    }
    let ws = Workspace::new();
    let remote = ws.remote("api");
    ws.clone_into_fleet(&remote, "api");

    let mut cmd = cargo_bin_cmd!("repo-fleet");
    let assert = cmd
        .current_dir(ws.path())
        .env_remove("REPO_FLEET_CONFIG")
        .args(["push", "fleet", "--refspec", "bad..name", "--format", "json"])
        .assert()
        .code(1);
    let json: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(json["outcomes"][0]["status"], "error");
    assert_eq!(json["summary"]["error"], 1);
}

#[test]
fn test_dry_run_pull_reports_plan() {
    if !git_available() {
        return;
    }
    let ws = Workspace::new();
    let remote = ws.remote("api");
    let repo = ws.clone_into_fleet(&remote, "api");
    ws.publish("api", 2);
    git(&repo, &["fetch", "-q"]);
    let before = head(&repo);

    let mut cmd = cargo_bin_cmd!("repo-fleet");
    cmd.current_dir(ws.path())
        .env_remove("REPO_FLEET_CONFIG")
        .args(["pull", "fleet", "--dry-run", "--color", "never"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("would-pull"));
    assert_eq!(head(&repo), before);
}

#[test]
fn test_completions_bash() {
    let mut cmd = cargo_bin_cmd!("repo-fleet");
    cmd.args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("complete -F"))
        .stdout(predicate::str::contains("repo-fleet"))
        .stdout(predicate::str::contains("switch"));
}
