#![allow(clippy::unwrap_used)]
// Integration tests for `HealthClient` using wiremock.

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use healthdash_api::models::DEFAULT_CATEGORY;
use healthdash_api::{ConfigUpdate, Error, HealthClient, ServiceDefinition, ServiceState};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, HealthClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&format!("{}/api", server.uri())).unwrap();
    let client = HealthClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

// ── Health ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_health() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "services": {
                "Core": [
                    {"name": "gateway", "url": "http://gw/health", "status": "healthy",
                     "statusCode": 200, "responseTime": 87},
                    {"name": "ledger", "url": "http://ledger/health", "status": "error",
                     "statusCode": 0, "responseTime": 5001, "message": "Connection refused"}
                ]
            },
            "summary": {"total": 2, "healthy": 1, "unhealthy": 0, "errors": 1,
                        "timestamp": "2024-06-15T10:30:00"}
        })))
        .mount(&server)
        .await;

    let report = client.get_health().await.unwrap();

    let core = &report.services["Core"];
    assert_eq!(core.len(), 2);
    assert_eq!(core[0].status, ServiceState::Healthy);
    assert_eq!(core[1].status, ServiceState::Error);
    assert_eq!(core[1].message.as_deref(), Some("Connection refused"));
    assert_eq!(report.summary.total, 2);
    assert_eq!(report.summary.errors, 1);
    assert!(report.summary.timestamp.is_some());
}

#[tokio::test]
async fn test_get_health_server_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(500).set_body_string("{\"error\":\"boom\"}"))
        .mount(&server)
        .await;

    let result = client.get_health().await;
    assert!(
        matches!(result, Err(Error::Http { status: 500, .. })),
        "expected Http error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_get_health_malformed_json() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
        .mount(&server)
        .await;

    let err = client.get_health().await.unwrap_err();
    assert!(err.is_protocol());
    match err {
        Error::Deserialization { body, .. } => assert!(body.contains("proxy error")),
        other => panic!("expected Deserialization, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    // Nothing listens on the discard port.
    let client = HealthClient::with_client(
        reqwest::Client::new(),
        Url::parse("http://127.0.0.1:9/api").unwrap(),
    );

    let err = client.get_health().await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)), "got {err:?}");
    assert!(err.is_unreachable());
}

// ── Environment ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_environment() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/environment"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"current": "homolog", "available": ["homolog", "prod"]})),
        )
        .mount(&server)
        .await;

    let env = client.get_environment().await.unwrap();
    assert_eq!(env.current, "homolog");
    assert_eq!(env.available, ["homolog", "prod"]);
}

#[tokio::test]
async fn test_set_environment_success() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/environment"))
        .and(body_json(json!({"environment": "prod"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "environment": "prod",
            "message": "Environment switched to: prod"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resp = client.set_environment("prod").await.unwrap();
    assert!(resp.success);
    assert_eq!(resp.environment.as_deref(), Some("prod"));
}

#[tokio::test]
async fn test_set_environment_rejection_is_not_an_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/environment"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": false, "error": "forbidden"})),
        )
        .mount(&server)
        .await;

    let resp = client.set_environment("prod").await.unwrap();
    assert!(!resp.success);
    assert_eq!(resp.error.as_deref(), Some("forbidden"));
}

#[tokio::test]
async fn test_set_environment_bad_request_carries_server_reason() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/environment"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"error": "Invalid environment: 'staging'"})),
        )
        .mount(&server)
        .await;

    let resp = client.set_environment("staging").await.unwrap();
    assert!(!resp.success);
    assert_eq!(resp.error.as_deref(), Some("Invalid environment: 'staging'"));
}

#[tokio::test]
async fn test_set_environment_non_json_failure_is_http_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/environment"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let result = client.set_environment("prod").await;
    assert!(
        matches!(result, Err(Error::Http { status: 502, .. })),
        "got {result:?}"
    );
}

// ── Config ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_config() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "refreshInterval": 15000,
            "timeout": 5000,
            "environment": "prod",
            "services": [{"name": "gateway", "url": "http://gw/health"}]
        })))
        .mount(&server)
        .await;

    let cfg = client.get_config().await.unwrap();
    assert_eq!(cfg.refresh_interval(), std::time::Duration::from_secs(15));
    assert_eq!(cfg.timeout_ms, Some(5000));
    assert_eq!(cfg.environment.as_deref(), Some("prod"));
    assert_eq!(cfg.services[0].category, DEFAULT_CATEGORY);
    assert_eq!(cfg.services[0].expected_status, 200);
}

#[tokio::test]
async fn test_save_config() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/config"))
        .and(body_json(json!({
            "refreshInterval": 20000,
            "timeout": 3000,
            "services": [{
                "name": "gateway", "url": "http://gw/health",
                "category": "Core", "expectedStatus": 204
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true, "message": "saved", "environment": "homolog"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let update = ConfigUpdate {
        refresh_interval_ms: 20_000,
        timeout_ms: 3_000,
        services: vec![ServiceDefinition {
            name: "gateway".into(),
            url: "http://gw/health".into(),
            category: "Core".into(),
            expected_status: 204,
        }],
    };

    let resp = client.save_config(&update).await.unwrap();
    assert!(resp.success);
    assert_eq!(resp.environment.as_deref(), Some("homolog"));
}
