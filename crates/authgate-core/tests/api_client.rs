//! HTTP login exchange tests.
//!
//! These tests use wiremock to stand in for the authentication backend.

use std::time::Duration;

use authgate_core::{ApiClient, ExchangeError, LoginRequest};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LOGIN_PATH: &str = "/api/auth/login";

#[tokio::test]
async fn test_login_posts_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .and(header("accept", "application/json"))
        .and(body_json(json!({"username": "alice", "password": "secret123"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "abc123",
            "data": {"role": "admin"},
            "username": "alice"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri()).unwrap();
    let response = client
        .authenticate(LoginRequest::new("alice", "secret123"))
        .await
        .unwrap();

    assert_eq!(response.token.as_deref(), Some("abc123"));
    assert_eq!(response.role(), Some("admin"));
    assert_eq!(response.username.as_deref(), Some("alice"));
}

#[tokio::test]
async fn test_login_empty_body_is_not_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri()).unwrap();
    let response = client
        .authenticate(LoginRequest::new("alice", "pw"))
        .await
        .unwrap();
    assert!(response.token.is_none());
}

#[tokio::test]
async fn test_login_unauthorized() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid credentials"})),
        )
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri()).unwrap();
    let err = client
        .authenticate(LoginRequest::new("alice", "wrong"))
        .await
        .unwrap_err();

    match err {
        ExchangeError::Rejected { status, body } => {
            assert_eq!(status, 401);
            assert!(body.contains("Invalid credentials"));
        }
        other => panic!("expected rejection, got {:?}", other),
    }
}

#[tokio::test]
async fn test_login_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri()).unwrap();
    let err = client
        .authenticate(LoginRequest::new("alice", "pw"))
        .await
        .unwrap_err();
    assert_eq!(err, ExchangeError::ServerError("maintenance".to_string()));
}

#[tokio::test]
async fn test_login_non_json_success_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri()).unwrap();
    let err = client
        .authenticate(LoginRequest::new("alice", "pw"))
        .await
        .unwrap_err();
    assert!(matches!(err, ExchangeError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_login_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"token": "late"}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client = ApiClient::with_timeout(server.uri(), Duration::from_millis(100)).unwrap();
    let err = client
        .authenticate(LoginRequest::new("alice", "pw"))
        .await
        .unwrap_err();
    assert_eq!(err, ExchangeError::Timeout);
}

#[tokio::test]
async fn test_login_connection_refused() {
    // Start and drop a server to get a port nobody listens on
    let uri = {
        let server = MockServer::start().await;
        server.uri()
    };

    let client = ApiClient::new(uri).unwrap();
    let err = client
        .authenticate(LoginRequest::new("alice", "pw"))
        .await
        .unwrap_err();
    assert!(matches!(err, ExchangeError::Network(_)));
}
