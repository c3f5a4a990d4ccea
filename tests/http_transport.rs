//! HttpTransport and the tree on top of it against a mocked Vault KV v2 API.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use kvtree::transport::{HttpTransport, KvTransport};
use kvtree::{
    AttributeStatus, BackendHealthCheck, Entry, ErrorCode, Navigator, SecretString,
    ServiceState, SessionContext, VaultClientConfig,
};

fn transport(server: &MockServer) -> HttpTransport {
    HttpTransport::new(
        &server.uri(),
        Some(SecretString::new("hvs.test-token")),
        Some("team-a".to_string()),
        Duration::from_secs(5),
    )
    .unwrap()
}

fn session(server: &MockServer) -> SessionContext {
    let config = VaultClientConfig {
        token: Some(SecretString::new("hvs.test-token")),
        ..VaultClientConfig::default().with_address(server.uri())
    };
    SessionContext::from_config(&config).unwrap()
}

fn read_body(data: serde_json::Value, version: u64) -> serde_json::Value {
    json!({
        "data": {
            "data": data,
            "metadata": {
                "created_time": "2024-05-01T10:15:30.123456789Z",
                "deletion_time": "",
                "destroyed": false,
                "version": version
            }
        }
    })
}

#[tokio::test]
async fn test_list_sends_headers_and_collapses_folders() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/metadata/alpha/"))
        .and(query_param("list", "true"))
        .and(header("X-Vault-Token", "hvs.test-token"))
        .and(header("X-Vault-Namespace", "team-a"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": { "keys": ["beta", "beta/", "gamma/"] } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let response = transport(&server).list("/secret/alpha/").await.unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.keys, vec!["beta", "gamma"]);
}

#[tokio::test]
async fn test_read_flattens_values() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/data/alpha"))
        .respond_with(ResponseTemplate::new(200).set_body_json(read_body(
            json!({ "text": "v", "number": 42, "flag": true, "nothing": null }),
            3,
        )))
        .mount(&server)
        .await;

    let response = transport(&server).read("/secret/alpha").await.unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.data.get("text"), Some(&Some("v".to_string())));
    assert_eq!(response.data.get("number"), Some(&Some("42".to_string())));
    assert_eq!(response.data.get("flag"), Some(&Some("true".to_string())));
    assert_eq!(response.data.get("nothing"), Some(&None));
    assert_eq!(response.raw["data"]["metadata"]["version"], json!(3));
}

#[tokio::test]
async fn test_statuses_are_returned_as_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/data/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "errors": [] })))
        .mount(&server)
        .await;

    let response = transport(&server).read("/secret/missing").await.unwrap();
    assert_eq!(response.status, 404);
    assert!(response.data.is_empty());
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let transport =
        HttpTransport::new("http://127.0.0.1:1", None, None, Duration::from_secs(2)).unwrap();
    let error = transport.read("/secret/alpha").await.unwrap_err();
    assert_eq!(error.status, None);
    assert!(error.message.contains("Vault request failed"));
}

#[tokio::test]
async fn test_example_scenario_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/secret/data/alpha"))
        .and(body_json(json!({ "data": {} })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "version": 1 } })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/secret/data/alpha"))
        .and(body_json(json!({ "data": { "k": "v" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "version": 2 } })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/data/alpha"))
        .respond_with(ResponseTemplate::new(200).set_body_json(read_body(json!({ "k": "v" }), 2)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/metadata/"))
        .and(query_param("list", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "keys": ["alpha"] } })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v1/secret/metadata/alpha"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let session = session(&server);
    let alpha = Navigator::root(&session).create("alpha").await.unwrap();
    assert!(alpha.is_valid());
    let alpha = alpha.into_payload();

    let manager = alpha.get_node_manager().into_payload();
    let written = manager.write(Entry::of("k", "v")).await;
    assert!(written.is_valid());
    assert_eq!(written.payload().value_as_string().as_deref(), Some("v"));
    assert_eq!(written.payload().metadata().version(), Some(2));
    assert_eq!(written.payload().metadata().path(), Some("/secret/alpha"));

    let deleted = alpha.delete().await;
    assert!(deleted.is_valid());
}

#[tokio::test]
async fn test_delete_with_unexpected_status_is_backend_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/metadata/"))
        .and(query_param("list", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "keys": ["alpha/"] } })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v1/secret/metadata/alpha"))
        .respond_with(ResponseTemplate::new(403).set_body_string("permission denied"))
        .mount(&server)
        .await;

    let alpha = Navigator::new(session(&server), "/alpha").unwrap();
    let result = alpha.delete().await;
    assert_eq!(result.error_code(), Some(ErrorCode::Forbidden));
    assert_eq!(
        result.detail().map(ToString::to_string).as_deref(),
        Some("Backend responded with HTTP status 403: permission denied")
    );
}

#[tokio::test]
async fn test_health_check() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/sys/health"))
        .and(query_param("standbyok", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "initialized": true,
            "sealed": true,
            "standby": false,
            "server_time_utc": 1714558530,
            "version": "1.15.2"
        })))
        .mount(&server)
        .await;

    let info = BackendHealthCheck::new(session(&server)).retrieve_server_info().await;
    assert_eq!(info.service_state, ServiceState::Active);
    assert_eq!(info.healthy, AttributeStatus::True);
    assert_eq!(info.unsealed, AttributeStatus::False);
    assert_eq!(info.initialized, AttributeStatus::True);
    assert_eq!(info.server_time_utc, Some(1714558530));
    assert_eq!(info.information.as_deref(), Some("Vault Server, version: 1.15.2"));
    assert_eq!(info.url, Some(server.uri()));
}
