#![allow(clippy::unwrap_used)]
// Integration tests for `PortalClient` using wiremock.

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use smartsec_api::{Error, PortalClient, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, PortalClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = PortalClient::new(base_url, &TransportConfig::default()).unwrap();
    (server, client)
}

fn status_body(arming: u8, fault: u8) -> serde_json::Value {
    json!({
        "alarm": {
            "armingState": arming,
            "targetState": 0,
            "faultStatus": fault,
            "batteryLevel": 64,
            "lowBatteryStatus": 0
        }
    })
}

// ── Authentication tests ────────────────────────────────────────────

#[tokio::test]
async fn test_login_success_stores_session_cookie() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .and(body_json(json!({ "username": "owner", "password": "hunter2" })))
        .respond_with(
            ResponseTemplate::new(200).insert_header("set-cookie", "SESSION=abc123; Path=/"),
        )
        .expect(1)
        .mount(&server)
        .await;

    assert!(!client.has_session());
    let secret: secrecy::SecretString = "hunter2".to_string().into();
    client.login("owner", &secret).await.unwrap();
    assert!(client.has_session());
}

#[tokio::test]
async fn test_login_failure() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .mount(&server)
        .await;

    let secret: secrecy::SecretString = "wrong".to_string().into();
    let result = client.login("owner", &secret).await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

// ── Status tests ────────────────────────────────────────────────────

#[tokio::test]
async fn test_current_status_sends_session_cookie() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("set-cookie", "SESSION=abc123; Path=/"),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/status"))
        .and(header("cookie", "SESSION=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body(4, 1)))
        .expect(1)
        .mount(&server)
        .await;

    let secret: secrecy::SecretString = "pw".to_string().into();
    client.login("owner", &secret).await.unwrap();
    let status = client.current_status().await.unwrap();

    assert_eq!(status.alarm.arming_state, 4);
    assert_eq!(status.alarm.fault_status, 1);
    assert_eq!(status.alarm.battery_level, 64);
}

#[tokio::test]
async fn test_current_status_unauthorized_is_session_expired() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.current_status().await;
    assert!(matches!(result, Err(Error::SessionExpired)), "got: {result:?}");
}

#[tokio::test]
async fn test_current_status_bad_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    match client.current_status().await {
        Err(Error::Deserialization { body, .. }) => assert!(body.contains("login")),
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}

// ── State change tests ──────────────────────────────────────────────

#[tokio::test]
async fn test_change_state_posts_target() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/state"))
        .and(body_json(json!({ "targetState": 1 })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.change_state(1).await.unwrap();
}

#[tokio::test]
async fn test_change_state_server_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/state"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = client.change_state(3).await.unwrap_err();
    assert!(matches!(err, Error::Portal { status: 502, .. }));
    assert!(err.is_transient());
}
