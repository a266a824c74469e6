//! Integration tests for the `sub` command.

mod common;

use common::TestEnv;
use predicates::prelude::*;

#[test]
fn test_sub_prints_projected_settings() {
    let env = TestEnv::new();

    env.command_with_log_config()
        .args(["sub", "log.max"])
        .assert()
        .success()
        .stdout("backups: 5\nsize: 50\n");
}

#[test]
fn test_sub_looks_up_relative_key() {
    let env = TestEnv::new();

    env.command_with_log_config()
        .args(["--env", "log.max.backups=3"])
        .args(["sub", "log", "max.backups"])
        .assert()
        .success()
        .stdout("3\n");
}

#[test]
fn test_sub_key_naming_a_section() {
    let env = TestEnv::new();

    env.command_with_log_config()
        .args(["sub", "log", "max", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"size\": 50"));
}

#[test]
fn test_sub_missing_key_exits_1() {
    let env = TestEnv::new();

    env.command_with_log_config()
        .args(["sub", "log", "rotation"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("'rotation' is not set under 'log'"));
}

#[test]
fn test_sub_missing_prefix_exits_1() {
    let env = TestEnv::new();

    env.command()
        .args(["sub", "log"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No sub-tree under 'log'"));
}
