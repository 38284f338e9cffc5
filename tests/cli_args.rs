//! Integration tests for CLI argument handling
//!
//! Runs the built binary against a throwaway cache directory and an
//! unreachable backend.

use std::process::Command;

/// Helper to run the CLI with given args and capture output
fn run_cli(cache_dir: &std::path::Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_cloudsaver"))
        .env("CLOUDSAVER_CACHE_DIR", cache_dir)
        .env("CLOUDSAVER_BASE_URL", "http://127.0.0.1:9")
        .env_remove("CLOUDSAVER_ON_UNAVAILABLE")
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("Failed to execute cloudsaver")
}

#[test]
fn test_help_flag_exits_successfully() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_cli(dir.path(), &["--help"]);
    assert!(
        output.status.success(),
        "Expected --help to exit successfully"
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("cloudsaver"), "Help should mention cloudsaver");
    assert!(stdout.contains("search"), "Help should list the search command");
    assert!(
        stdout.contains("--on-unavailable"),
        "Help should mention --on-unavailable"
    );
}

#[test]
fn test_invalid_policy_prints_error_and_exits() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_cli(dir.path(), &["--on-unavailable", "retry", "sponsors"]);
    assert!(!output.status.success(), "Expected invalid policy to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("invalid") || stderr.contains("possible values"),
        "Should print error message about invalid policy: {}",
        stderr
    );
}

#[test]
fn test_register_then_whoami_prints_json() {
    let dir = tempfile::tempdir().unwrap();

    let register = run_cli(dir.path(), &["register", "alice", "pw1", "9527"]);
    assert!(register.status.success(), "{:?}", register);

    let login = run_cli(dir.path(), &["login", "alice", "pw1"]);
    assert!(login.status.success(), "{:?}", login);

    let whoami = run_cli(dir.path(), &["whoami"]);
    assert!(whoami.status.success());
    let body: serde_json::Value = serde_json::from_slice(&whoami.stdout).unwrap();
    assert_eq!(body["code"], 0);
    assert_eq!(body["data"]["username"], "alice");
}

#[test]
fn test_wrong_password_fails() {
    let dir = tempfile::tempdir().unwrap();
    run_cli(dir.path(), &["register", "alice", "pw1", "9527"]);

    let output = run_cli(dir.path(), &["login", "alice", "wrong"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("wrong username or password"), "{}", stderr);
}

#[test]
fn test_unreachable_backend_with_placeholder_policy() {
    let dir = tempfile::tempdir().unwrap();

    let strict = run_cli(dir.path(), &["sponsors"]);
    assert!(!strict.status.success());

    let lenient = run_cli(dir.path(), &["--on-unavailable", "placeholder", "sponsors"]);
    assert!(lenient.status.success(), "{:?}", lenient);
    let body: serde_json::Value = serde_json::from_slice(&lenient.stdout).unwrap();
    assert_eq!(body["code"], 0);
    assert!(body["data"].is_array());
}
