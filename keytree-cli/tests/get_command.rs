//! Integration tests for the `get` command.

mod common;

use common::TestEnv;
use predicates::prelude::*;

#[test]
fn test_get_prints_nested_section_from_file() {
    let env = TestEnv::new();

    env.command_with_log_config()
        .args(["get", "log.max"])
        .assert()
        .success()
        .stdout("backups: 5\nsize: 50\n");
}

#[test]
fn test_get_merges_all_sources() {
    let env = TestEnv::new();

    env.command_with_log_config()
        .args(["--default", "log.max.age=31"])
        .args(["--env", "log.level=debug"])
        .args(["get", "log"])
        .assert()
        .success()
        .stdout(predicate::str::contains("level: debug"))
        .stdout(predicate::str::contains("age: 31"))
        .stdout(predicate::str::contains("filename: logs/latest.log"));
}

#[test]
fn test_get_json_output() {
    let env = TestEnv::new();

    let output = env
        .command()
        .args(["--default", "log.max.size=50", "--default", "log.level=info"])
        .args(["get", "log", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        parsed,
        serde_json::json!({ "level": "info", "max": { "size": 50 } })
    );
}

#[test]
fn test_get_format_from_env() {
    let env = TestEnv::new();

    env.command()
        .env("KEYTREE_OUTPUT_FORMAT", "json")
        .args(["--default", "log.level=info", "get", "log"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"level\": \"info\""));
}

#[test]
fn test_get_missing_prefix_exits_1() {
    let env = TestEnv::new();

    env.command_with_log_config()
        .args(["get", "http"])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("No sub-tree under 'http'"));
}

#[test]
fn test_get_single_value_prefix_hints() {
    let env = TestEnv::new();

    env.command()
        .args(["--default", "log=fail", "get", "log"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("bound to a single value"));
}

#[test]
fn test_get_collision_fails() {
    let env = TestEnv::new();

    env.command_with_log_config()
        .args(["--set", "log.max=10", "get", "log"])
        .assert()
        .code(6)
        .stderr(predicate::str::contains("max"));
}
