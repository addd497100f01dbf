//! Integration tests for `cjsload --json` output.
//!
//! These tests verify:
//! - JSON output is always valid JSON
//! - `ok` is false and the exit code is 1 when resolution fails
//! - Error codes are SCREAMING_SNAKE_CASE

use std::path::Path;
use std::process::{Command, Output};
use tempfile::tempdir;

fn cargo_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO"));
    cmd.args(["run", "-p", "cjsload-cli", "--bin", "cjsload", "--"]);
    cmd.env_remove("NODE_PATH");
    cmd.env_remove("NODE_PRESERVE_SYMLINKS");
    cmd
}

fn run_json(cwd: &Path, args: &[&str]) -> (Output, serde_json::Value) {
    let output = cargo_bin()
        .args(args)
        .args(["--json", "--cwd"])
        .arg(cwd)
        .output()
        .expect("Failed to run cjsload");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json = serde_json::from_str(&stdout).expect("Output should be valid JSON");
    (output, json)
}

#[test]
fn test_resolve_relative_file() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("util.js"), "").unwrap();

    let (output, json) = run_json(dir.path(), &["resolve", "./util"]);

    assert!(output.status.success());
    assert_eq!(json["ok"], true);
    assert_eq!(json["specifier"], "./util");
    assert_eq!(json["builtin"], false);
    assert!(json["resolved"].as_str().unwrap().ends_with("util.js"));
    assert!(json.get("error").is_none());
}

#[test]
fn test_resolve_builtin() {
    let dir = tempdir().unwrap();
    let (output, json) = run_json(dir.path(), &["resolve", "path"]);

    assert!(output.status.success());
    assert_eq!(json["builtin"], true);
    assert_eq!(json["resolved"], "path");
}

#[test]
fn test_resolve_missing_module_fails() {
    let dir = tempdir().unwrap();
    let (output, json) = run_json(dir.path(), &["resolve", "does-not-exist"]);

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(json["ok"], false);
    assert!(json["resolved"].is_null());
    assert_eq!(json["error"]["code"], "MODULE_NOT_FOUND");
    assert_eq!(
        json["error"]["message"],
        "Cannot find module 'does-not-exist'"
    );

    let code = json["error"]["code"].as_str().unwrap();
    assert!(code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_'));
}

#[test]
fn test_resolve_from_file_uses_its_node_modules() {
    let dir = tempdir().unwrap();
    let pkg = dir.path().join("app").join("node_modules").join("dep");
    std::fs::create_dir_all(&pkg).unwrap();
    std::fs::write(pkg.join("package.json"), r#"{"main": "entry.js"}"#).unwrap();
    std::fs::write(pkg.join("entry.js"), "").unwrap();
    std::fs::write(dir.path().join("app").join("main.js"), "").unwrap();

    let (output, json) = run_json(dir.path(), &["resolve", "dep", "--from", "app/main.js"]);

    assert!(output.status.success());
    assert!(json["resolved"].as_str().unwrap().ends_with("entry.js"));
}

#[test]
fn test_lookup_relative_from_entry_context() {
    let dir = tempdir().unwrap();
    let (output, json) = run_json(dir.path(), &["lookup", "./x"]);

    assert!(output.status.success());
    assert_eq!(json["id"], "./x");
    assert!(json["paths"].as_array().unwrap().len() >= 2);
}

#[test]
fn test_lookup_relative_id_is_absolute() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("main.js"), "").unwrap();
    let (output, json) = run_json(dir.path(), &["lookup", "./lib/a", "--from", "main.js"]);

    assert!(output.status.success());
    let id = json["id"].as_str().unwrap();
    assert!(Path::new(id).is_absolute());
    assert!(Path::new(id).ends_with("lib/a"));
}

#[test]
fn test_paths_lists_node_modules_chain() {
    let dir = tempdir().unwrap();
    let (output, json) = run_json(dir.path(), &["paths", "a/b"]);

    assert!(output.status.success());
    let chain = json["node_modules"].as_array().unwrap();
    let first = chain[0].as_str().unwrap();
    assert!(first.ends_with("node_modules"));
    assert!(first.contains('b'));
    assert!(json["global"].is_array());
}

#[test]
fn test_version_json() {
    let dir = tempdir().unwrap();
    let (output, json) = run_json(dir.path(), &["version"]);

    assert!(output.status.success());
    assert_eq!(json["name"], "cjsload");
    assert!(json["version"].is_string());
}
