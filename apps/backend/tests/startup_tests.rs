//! The server binary refuses to start without a usable configuration.

use std::process::{Command, Output};

fn run_backend(envs: &[(&str, &str)]) -> Output {
    // No .env in a fresh temp dir, so only the variables below apply.
    let cwd = tempfile::tempdir().expect("create temp cwd");
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_astrotalk-backend"));
    cmd.current_dir(cwd.path())
        .env_remove("MONGO_URI")
        .env_remove("MONGODB_URI")
        .env_remove("BACKEND_PORT")
        .env("RUST_LOG", "error");
    for (key, value) in envs {
        cmd.env(key, value);
    }
    cmd.output().expect("run backend binary")
}

#[test]
fn test_missing_mongo_uri_exits_non_zero() {
    let output = run_backend(&[]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("MONGO_URI"), "stderr: {stderr}");
    assert!(stderr.contains("MONGODB_URI"), "stderr: {stderr}");
}

#[test]
fn test_empty_mongo_uri_counts_as_missing() {
    let output = run_backend(&[("MONGO_URI", "  "), ("MONGODB_URI", "")]);

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_malformed_port_exits_non_zero() {
    let output = run_backend(&[
        ("MONGO_URI", "mongodb://127.0.0.1:27017/astrotalk"),
        ("BACKEND_PORT", "not-a-port"),
    ]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("BACKEND_PORT"), "stderr: {stderr}");
}
