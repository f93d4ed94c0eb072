//! Integration tests for the `healthdash` CLI binary.
//!
//! Local commands run against a throwaway config directory; network
//! commands run against a wiremock health API.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// `healthdash` with env isolation: no `HEALTHDASH_*` leakage and config
/// directories pointed at `home`.
fn healthdash_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("healthdash");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("NO_COLOR", "1")
        .env_remove("HEALTHDASH_PROFILE")
        .env_remove("HEALTHDASH_API_URL")
        .env_remove("HEALTHDASH_OUTPUT")
        .env_remove("HEALTHDASH_INSECURE")
        .env_remove("HEALTHDASH_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

/// Run a prepared command off the async runtime so the mock server keeps
/// serving.
async fn run(mut cmd: assert_cmd::Command) -> std::process::Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

fn stdout(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

async fn mock_api() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/environment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"current": "homolog", "available": ["homolog", "prod", "staging"]}),
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "refreshInterval": 15000,
            "timeout": 5000,
            "environment": "homolog",
            "services": [
                {"name": "billing", "url": "http://billing/health", "category": "Payments"}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "services": {
                "Payments": [
                    {"name": "billing", "url": "http://billing/health", "status": "healthy",
                     "statusCode": 200, "responseTime": 120},
                    {"name": "ledger", "url": "http://ledger/health", "status": "unhealthy",
                     "statusCode": 503, "responseTime": 2400}
                ]
            },
            "summary": {"total": 2, "healthy": 1, "unhealthy": 1, "errors": 0,
                        "timestamp": "2024-06-15T10:30:00"}
        })))
        .mount(&server)
        .await;
    server
}

fn api_url(server: &MockServer) -> String {
    format!("{}/api", server.uri())
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let home = tempfile::tempdir().unwrap();
    let output = healthdash_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("Usage"));
}

#[test]
fn test_help_lists_commands() {
    let home = tempfile::tempdir().unwrap();
    healthdash_cmd(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("status")
                .and(predicate::str::contains("watch"))
                .and(predicate::str::contains("env")),
        );
}

#[test]
fn test_version_flag() {
    let home = tempfile::tempdir().unwrap();
    healthdash_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("healthdash"));
}

#[test]
fn test_completions_zsh() {
    let home = tempfile::tempdir().unwrap();
    healthdash_cmd(home.path())
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_invalid_output_format() {
    let home = tempfile::tempdir().unwrap();
    healthdash_cmd(home.path())
        .args(["--output", "xml", "status"])
        .assert()
        .failure()
        .code(2);
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_is_under_config_home() {
    let home = tempfile::tempdir().unwrap();
    healthdash_cmd(home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("healthdash")
                .and(predicate::str::ends_with("config.toml\n")),
        );
}

#[test]
fn test_config_init_then_profiles() {
    let home = tempfile::tempdir().unwrap();
    healthdash_cmd(home.path())
        .args(["--api-url", "http://health.internal:3000/api", "config", "init", "--name", "lab"])
        .assert()
        .success();

    let output = healthdash_cmd(home.path())
        .args(["-o", "plain", "config", "profiles"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "lab");

    healthdash_cmd(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("default_profile = \"lab\"")
                .and(predicate::str::contains("http://health.internal:3000/api")),
        );
}

#[test]
fn test_config_init_refuses_to_overwrite() {
    let home = tempfile::tempdir().unwrap();
    healthdash_cmd(home.path())
        .args(["config", "init"])
        .assert()
        .success();
    healthdash_cmd(home.path())
        .args(["config", "init"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn test_config_init_rejects_bad_url() {
    let home = tempfile::tempdir().unwrap();
    healthdash_cmd(home.path())
        .args(["--api-url", "ftp://nowhere", "config", "init"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_unknown_profile_is_usage_error() {
    let home = tempfile::tempdir().unwrap();
    healthdash_cmd(home.path())
        .args(["--profile", "missing", "status"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("missing"));
}

// ── Network commands ────────────────────────────────────────────────

#[test]
fn test_status_unreachable_exits_with_connection_code() {
    let home = tempfile::tempdir().unwrap();
    healthdash_cmd(home.path())
        .args(["--api-url", "http://127.0.0.1:1/api", "--timeout", "2", "status"])
        .assert()
        .failure()
        .code(7);
}

#[tokio::test]
async fn test_status_server_error_is_not_a_connection_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;
    let home = tempfile::tempdir().unwrap();
    let mut cmd = healthdash_cmd(home.path());
    cmd.args(["--api-url", &api_url(&server), "status"]);

    let output = run(cmd).await;
    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("502"));
}

#[tokio::test]
async fn test_status_renders_table() {
    let server = mock_api().await;
    let home = tempfile::tempdir().unwrap();
    let mut cmd = healthdash_cmd(home.path());
    cmd.args(["--api-url", &api_url(&server), "status"]);

    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    let text = stdout(&output);
    assert!(text.contains("Environment: homolog"));
    assert!(text.contains("Last updated: 15/06/2024 10:30:00"));
    assert!(text.contains("Payments  1/2 operational"));
    assert!(text.contains("Degraded"));
}

#[tokio::test]
async fn test_status_json_and_problems_filter() {
    let server = mock_api().await;
    let home = tempfile::tempdir().unwrap();
    let mut cmd = healthdash_cmd(home.path());
    cmd.args(["--api-url", &api_url(&server), "-o", "json", "status", "--problems"]);

    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    let view: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let services = view["panel"]["data"][0]["services"].as_array().unwrap();
    assert_eq!(services.len(), 1);
    assert_eq!(services[0]["name"], "ledger");
    assert_eq!(view["summary"]["total"], 2);
}

#[tokio::test]
async fn test_status_check_fails_when_degraded() {
    let server = mock_api().await;
    let home = tempfile::tempdir().unwrap();
    let mut cmd = healthdash_cmd(home.path());
    cmd.args(["--api-url", &api_url(&server), "-q", "status", "--check"]);

    let output = run(cmd).await;
    assert_eq!(output.status.code(), Some(3));
}

#[tokio::test]
async fn test_env_list_marks_current() {
    let server = mock_api().await;
    let home = tempfile::tempdir().unwrap();
    let mut cmd = healthdash_cmd(home.path());
    cmd.args(["--api-url", &api_url(&server), "-o", "json", "env", "list"]);

    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    let entries: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        entries,
        json!([
            {"name": "homolog", "current": true},
            {"name": "prod", "current": false},
            {"name": "staging", "current": false}
        ])
    );
}

#[tokio::test]
async fn test_env_set_commits() {
    let server = mock_api().await;
    Mock::given(method("POST"))
        .and(path("/api/environment"))
        .and(body_json(json!({"environment": "prod"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "environment": "prod"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    let mut cmd = healthdash_cmd(home.path());
    cmd.args(["--api-url", &api_url(&server), "env", "set", "prod"]);

    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert!(stdout(&output).contains("Switched to prod (was homolog)"));
}

#[tokio::test]
async fn test_env_set_same_environment_sends_nothing() {
    let server = mock_api().await;
    Mock::given(method("POST"))
        .and(path("/api/environment"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    let mut cmd = healthdash_cmd(home.path());
    cmd.args(["--api-url", &api_url(&server), "-o", "plain", "env", "set", "homolog"]);

    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(stdout(&output).trim(), "homolog");
}

#[tokio::test]
async fn test_env_set_rejected_exits_with_rejected_code() {
    let server = mock_api().await;
    Mock::given(method("POST"))
        .and(path("/api/environment"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"success": false, "error": "Invalid environment"})),
        )
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    let mut cmd = healthdash_cmd(home.path());
    cmd.args(["--api-url", &api_url(&server), "env", "set", "qa"]);

    let output = run(cmd).await;
    assert_eq!(output.status.code(), Some(6));
    assert!(combined_output(&output).contains("Invalid environment"));
}

#[tokio::test]
async fn test_config_push_posts_update() {
    let server = mock_api().await;
    Mock::given(method("POST"))
        .and(path("/api/config"))
        .and(body_json(json!({
            "refreshInterval": 20000,
            "timeout": 4000,
            "services": [
                {"name": "web", "url": "http://web/health", "category": "Frontend",
                 "expectedStatus": 200}
            ]
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "message": "Configuration saved"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    let file = home.path().join("services.json");
    std::fs::write(
        &file,
        json!({
            "refreshInterval": 20000,
            "timeout": 4000,
            "services": [{"name": "web", "url": "http://web/health", "category": "Frontend"}]
        })
        .to_string(),
    )
    .unwrap();

    let mut cmd = healthdash_cmd(home.path());
    cmd.args(["--api-url", &api_url(&server), "config", "push"])
        .arg(&file);

    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("Configuration saved"));
}

#[tokio::test]
async fn test_watch_stops_after_count() {
    let server = mock_api().await;
    let home = tempfile::tempdir().unwrap();
    let mut cmd = healthdash_cmd(home.path());
    cmd.args(["--api-url", &api_url(&server), "-o", "plain", "watch", "-n", "1"]);

    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(
        stdout(&output).lines().collect::<Vec<_>>(),
        ["Payments\tbilling\thealthy\t120ms", "Payments\tledger\tunhealthy\t2.40s"]
    );
}
