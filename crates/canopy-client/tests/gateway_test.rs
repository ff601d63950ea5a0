//! Gateway behaviour against a fake dashboard server

use std::sync::Arc;
use std::time::Duration;

use canopy_client::{
    ClientError, CredentialStore, Gateway, GatewayConfig, MemoryCredentialStore,
};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn gateway_for(server: &MockServer, credentials: Arc<MemoryCredentialStore>) -> Gateway {
    Gateway::new(
        GatewayConfig {
            base_url: format!("{}/api", server.uri()),
            timeout_ms: 500,
            ..Default::default()
        },
        credentials,
    )
    .expect("gateway")
}

#[tokio::test]
async fn test_attaches_bearer_token_when_present() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/dashboard/stats"))
        .and(header("authorization", "Bearer abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"totalTrees": 3}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gw = gateway_for(&server, Arc::new(MemoryCredentialStore::with_token("abc123")));
    let resp = gw.get::<Value>("/dashboard/stats").await.unwrap();

    assert!(resp.success);
    assert_eq!(resp.data.unwrap()["totalTrees"], 3);
}

#[tokio::test]
async fn test_omits_authorization_without_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/dashboard/stats"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/dashboard/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .mount(&server)
        .await;

    let gw = gateway_for(&server, Arc::new(MemoryCredentialStore::new()));
    let resp = gw.get::<Value>("/dashboard/stats").await.unwrap();
    assert!(resp.success);
    assert!(resp.data.is_none());
}

#[tokio::test]
async fn test_sends_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/dashboard/care-records"))
        .and(body_json(json!({"treeId": "t1", "action": "watering"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "success": true,
            "data": {"_id": "c1"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gw = gateway_for(&server, Arc::new(MemoryCredentialStore::new()));
    let resp = gw
        .post::<Value, _>(
            "/dashboard/care-records",
            &json!({"treeId": "t1", "action": "watering"}),
        )
        .await
        .unwrap();
    assert_eq!(resp.data.unwrap()["_id"], "c1");
}

#[tokio::test]
async fn test_non_2xx_carries_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/dashboard/trees/t1"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "success": false,
            "message": "forbidden"
        })))
        .mount(&server)
        .await;

    let gw = gateway_for(&server, Arc::new(MemoryCredentialStore::new()));
    let err = gw.delete::<Value>("/dashboard/trees/t1").await.unwrap_err();

    assert_eq!(err.status(), Some(403));
    assert_eq!(err.to_string(), "forbidden");
}

#[tokio::test]
async fn test_non_2xx_without_message_uses_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/dashboard/stats"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
        .mount(&server)
        .await;

    let gw = gateway_for(&server, Arc::new(MemoryCredentialStore::new()));
    let err = gw.get::<Value>("/dashboard/stats").await.unwrap_err();
    assert_eq!(err.to_string(), "Request failed with HTTP status 502");
}

#[tokio::test]
async fn test_error_body_without_envelope_keeps_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/dashboard/trees"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "Token expired"
        })))
        .mount(&server)
        .await;

    let credentials = Arc::new(MemoryCredentialStore::with_token("stale"));
    let gw = gateway_for(&server, credentials.clone());
    let err = gw.get::<Value>("/dashboard/trees").await.unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert_eq!(err.to_string(), "Token expired");
    assert!(credentials.token().is_none());
}

#[tokio::test]
async fn test_unauthorized_clears_credential() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/dashboard/trees"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "success": false,
            "message": "Token expired"
        })))
        .mount(&server)
        .await;

    let credentials = Arc::new(MemoryCredentialStore::with_token("stale"));
    let gw = gateway_for(&server, credentials.clone());
    let err = gw.get::<Value>("/dashboard/trees").await.unwrap_err();

    assert!(err.is_unauthorized());
    assert!(credentials.token().is_none());
}

#[tokio::test]
async fn test_timeout_surfaces_as_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/dashboard/stats"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true}))
                .set_delay(Duration::from_millis(2_000)),
        )
        .mount(&server)
        .await;

    let gw = gateway_for(&server, Arc::new(MemoryCredentialStore::new()));
    let err = gw.get::<Value>("/dashboard/stats").await.unwrap_err();
    assert!(matches!(err, ClientError::Timeout(500)));
}

#[tokio::test]
async fn test_malformed_json_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/dashboard/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    let gw = gateway_for(&server, Arc::new(MemoryCredentialStore::new()));
    let err = gw.get::<Value>("/dashboard/stats").await.unwrap_err();
    assert!(matches!(err, ClientError::Decode(_)));
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let gw = Gateway::new(
        GatewayConfig {
            base_url: "http://127.0.0.1:1/api".to_string(),
            timeout_ms: 1_000,
            ..Default::default()
        },
        Arc::new(MemoryCredentialStore::new()),
    )
    .unwrap();

    let err = gw.get::<Value>("/dashboard/stats").await.unwrap_err();
    assert!(matches!(err, ClientError::Network(_) | ClientError::Timeout(_)));
}
