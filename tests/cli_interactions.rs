//! CLI option and exit-status tests
//!
//! Every command runs from an empty temporary directory with the ARENA_*
//! environment cleared, so no `.env` file or shell setting leaks in.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

const ARENA_VARS: &[&str] = &[
    "ARENA_HOST",
    "ARENA_PROTOCOLS",
    "ARENA_REST_PORT",
    "ARENA_GRAPHQL_PORT",
    "ARENA_SSE_PORT",
    "ARENA_WEBSOCKET_PORT",
    "ARENA_GRPC_PORT",
    "ARENA_ITERATIONS",
    "ARENA_LIMIT",
    "ARENA_PAYLOAD_SIZES",
    "ARENA_DURATION_SECONDS",
    "ARENA_BATCH_SIZE",
    "ARENA_CLIENTS",
    "ARENA_REQUESTS_PER_CLIENT",
    "ARENA_TIMEOUT_SECONDS",
    "ARENA_ENABLE_COLOR",
    "ARENA_REST_CMD",
    "ARENA_GRAPHQL_CMD",
    "ARENA_SSE_CMD",
    "ARENA_WEBSOCKET_CMD",
    "ARENA_GRPC_CMD",
];

/// Command isolated from the caller's environment; keep the TempDir alive
fn create_test_cmd() -> (Command, TempDir) {
    let dir = TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("arena-bench").unwrap();
    cmd.current_dir(dir.path());
    for var in ARENA_VARS {
        cmd.env_remove(var);
    }
    (cmd, dir)
}

fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Flags pointing every protocol at a port nobody listens on
fn closed_port_args() -> Vec<String> {
    let mut args = vec!["--host".to_string(), "127.0.0.1".to_string()];
    for flag in ["--rest-port", "--graphql-port", "--sse-port", "--websocket-port", "--grpc-port"] {
        args.push(flag.to_string());
        args.push(closed_port().to_string());
    }
    args
}

#[test]
fn test_help_lists_options() {
    let (mut cmd, _dir) = create_test_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--protocol"))
        .stdout(predicate::str::contains("--mode"))
        .stdout(predicate::str::contains("--spawn"));
}

#[test]
fn test_env_help_lists_variables() {
    let (mut cmd, _dir) = create_test_cmd();
    cmd.arg("--env-help")
        .assert()
        .success()
        .stdout(predicate::str::contains("ARENA_REST_PORT"))
        .stdout(predicate::str::contains("Configuration Priority"));
}

#[test]
fn test_init_env_writes_example_file() {
    let (mut cmd, dir) = create_test_cmd();
    cmd.arg("--init-env").assert().success();

    let content = std::fs::read_to_string(dir.path().join(".env.example")).unwrap();
    assert!(content.contains("ARENA_HOST"));
    assert!(content.contains("ARENA_GRPC_CMD"));
}

#[test]
fn test_invalid_count_is_config_error() {
    let (mut cmd, _dir) = create_test_cmd();
    cmd.args(["-n", "0", "--no-color"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--count"));
}

#[test]
fn test_conflicting_color_flags() {
    let (mut cmd, _dir) = create_test_cmd();
    cmd.args(["--color", "--no-color"]).assert().code(1);
}

#[test]
fn test_unknown_protocol_rejected_by_parser() {
    let (mut cmd, _dir) = create_test_cmd();
    cmd.args(["-p", "soap"]).assert().failure();
}

#[test]
fn test_spawn_without_commands() {
    let (mut cmd, _dir) = create_test_cmd();
    cmd.args(["--spawn", "--no-color"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("ARENA_<PROTOCOL>_CMD"));
}

#[test]
fn test_invalid_env_file_value() {
    let (mut cmd, dir) = create_test_cmd();
    std::fs::write(dir.path().join(".env"), "ARENA_CLIENTS=lots\n").unwrap();
    cmd.args(["--mode", "health", "--no-color"]).assert().code(1);
}

#[test]
fn test_health_mode_with_nothing_running() {
    let (mut cmd, _dir) = create_test_cmd();
    cmd.args(["--mode", "health", "--no-color", "--timeout", "1"])
        .args(closed_port_args())
        .timeout(Duration::from_secs(30))
        .assert()
        .code(4)
        .stdout(predicate::str::contains("0 of 5 protocols active"))
        .stderr(predicate::str::contains("0 active protocols"));
}

#[test]
fn test_json_health_report_with_nothing_running() {
    let (mut cmd, _dir) = create_test_cmd();
    let output = cmd
        .args(["--mode", "health", "--json", "--timeout", "1", "-p", "rest", "-p", "grpc"])
        .args(closed_port_args())
        .timeout(Duration::from_secs(30))
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(4));
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["active_protocols"], json!([]));
    assert_eq!(report["health"]["probes"].as_array().unwrap().len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_latency_run_against_mock_rest_backend() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "healthy" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/logs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "user_id": 7, "action": "login", "timestamp": "2024-01-01T00:00:00" }
        ])))
        .mount(&server)
        .await;

    let port = server.address().port().to_string();
    let output = tokio::task::spawn_blocking(move || {
        let (mut cmd, _dir) = create_test_cmd();
        cmd.args(["--mode", "latency", "-p", "rest", "--host", "127.0.0.1", "--rest-port", &port, "-n", "5", "--json"])
            .timeout(Duration::from_secs(30))
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["latency"][0]["protocol"], "rest");
    assert_eq!(report["latency"][0]["summary"]["count"], 5);
    assert_eq!(report["rankings"][0]["protocol"], "rest");
}
