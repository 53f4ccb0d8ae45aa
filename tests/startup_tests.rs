//! Tests for main.rs startup validation and the background server helper.

mod common;

use std::io::{Read, Write};
use std::net::TcpStream;
use std::process::{Command, Stdio};

use tokencookie::{ServerConfig, db::Database, start_server};

fn run_binary(envs: &[(&str, &str)], args: &[&str]) -> (bool, String) {
    let mut command = Command::new(env!("CARGO_BIN_EXE_tokencookie"));
    command
        .env_remove("JWT_SECRET")
        .env_remove("CREATE_USER_PASSWORD")
        .args(["--database", ":memory:", "--port", "0"])
        .args(args)
        .stderr(Stdio::piped())
        .stdout(Stdio::piped());
    for (key, value) in envs {
        command.env(key, value);
    }
    let output = command.output().expect("Failed to run binary");

    // tracing logs to stdout by default
    let combined = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    (output.status.success(), combined)
}

#[test]
fn test_missing_jwt_secret_exits_with_error() {
    let (success, output) = run_binary(&[], &[]);

    assert!(!success, "Should exit with error when JWT_SECRET is missing");
    assert!(
        output.contains("JWT_SECRET") && output.contains("required"),
        "Should mention JWT_SECRET is required, got: {}",
        output
    );
}

#[test]
fn test_short_jwt_secret_exits_with_error() {
    let (success, output) = run_binary(&[("JWT_SECRET", "too-short")], &[]);

    assert!(!success, "Should exit with error when JWT_SECRET is short");
    assert!(
        output.contains("shorter than"),
        "Should mention the minimum length, got: {}",
        output
    );
}

#[test]
fn test_create_user_without_password_exits_with_error() {
    let (success, output) = run_binary(
        &[("JWT_SECRET", "test-secret-that-is-long-enough!!")],
        &["--create-user", "alice"],
    );

    assert!(!success);
    assert!(
        output.contains("CREATE_USER_PASSWORD"),
        "Should mention CREATE_USER_PASSWORD, got: {}",
        output
    );
}

#[test]
fn test_zero_lifetime_exits_with_error() {
    let (success, _) = run_binary(
        &[("JWT_SECRET", "test-secret-that-is-long-enough!!")],
        &["--access-token-lifetime", "0"],
    );

    assert!(!success);
}

#[tokio::test]
async fn test_start_server_serves_health() {
    let db = Database::open(":memory:").await.unwrap();
    let config = ServerConfig {
        db,
        jwt_secret: common::JWT_SECRET.to_vec(),
        lifetimes: common::LIFETIMES,
        secure_cookies: false,
    };

    let (handle, addr) = start_server(config, 0).await.unwrap();

    let response = tokio::task::spawn_blocking(move || {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream
            .write_all(b"GET /api/health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();
        response
    })
    .await
    .unwrap();

    assert!(response.starts_with("HTTP/1.1 200"), "got: {}", response);
    assert!(response.contains("\"status\":\"ok\""));

    handle.abort();
}
