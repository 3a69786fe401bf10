use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn bin_cmd(home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("typesprint").unwrap();
    cmd.env("HOME", home)
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("XDG_DATA_HOME")
        .env_remove("XDG_STATE_HOME");
    cmd
}

#[test]
fn history_on_fresh_install_is_empty() {
    let home = tempdir().unwrap();
    bin_cmd(home.path())
        .arg("--history")
        .assert()
        .success()
        .stdout(predicate::str::contains("no results yet"));
}

#[test]
fn leaderboard_on_fresh_install_is_empty() {
    let home = tempdir().unwrap();
    bin_cmd(home.path())
        .arg("--leaderboard")
        .assert()
        .success()
        .stdout(predicate::str::contains("leaderboard is empty"));
}

#[test]
fn leaderboard_and_history_conflict() {
    let home = tempdir().unwrap();
    bin_cmd(home.path())
        .args(["--leaderboard", "--history"])
        .assert()
        .failure();
}

#[test]
fn unknown_difficulty_is_rejected() {
    let home = tempdir().unwrap();
    bin_cmd(home.path())
        .args(["--difficulty", "nightmare", "--history"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nightmare"));
}

#[test]
fn interactive_mode_requires_a_tty() {
    let home = tempdir().unwrap();
    bin_cmd(home.path())
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("stdin must be a tty"));
}
