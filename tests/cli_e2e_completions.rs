//! End-to-end tests for the `completions` command.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_completions_help() {
    cargo_bin_cmd!("community")
        .args(["completions", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bash"))
        .stdout(predicate::str::contains("powershell"));
}

#[test]
fn test_completions_bash() {
    cargo_bin_cmd!("community")
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("_community()"))
        .stdout(predicate::str::contains("sync-actions"));
}

#[test]
fn test_completions_zsh() {
    cargo_bin_cmd!("community")
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef community"));
}

#[test]
fn test_completions_fish() {
    cargo_bin_cmd!("community")
        .args(["completions", "fish"])
        .assert()
        .success()
        .stdout(predicate::str::contains("complete -c community"));
}

#[test]
fn test_completions_powershell() {
    cargo_bin_cmd!("community")
        .args(["completions", "powershell"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Register-ArgumentCompleter"));
}

#[test]
fn test_completions_invalid_shell() {
    cargo_bin_cmd!("community")
        .args(["completions", "tcsh"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}
