use std::fmt;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use super::ExchangeError;

/// Credential pair sent to the login endpoint.
#[derive(Clone, Copy, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

impl<'a> LoginRequest<'a> {
    pub fn new(username: &'a str, password: &'a str) -> Self {
        Self { username, password }
    }
}

// Never print the password
impl fmt::Debug for LoginRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Body of a successful (2xx) login response.
///
/// Every field is optional on the wire: a response without `token` is a
/// protocol violation the session manager reports, not a decode failure.
#[derive(Clone, Default, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub data: Option<LoginData>,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginData {
    #[serde(default)]
    pub role: Option<String>,
}

impl LoginResponse {
    /// Role carried under `data.role`, if any
    pub fn role(&self) -> Option<&str> {
        self.data.as_ref().and_then(|d| d.role.as_deref())
    }
}

impl fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginResponse")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("data", &self.data)
            .field("username", &self.username)
            .finish()
    }
}

/// The remote half of a sign-in.
///
/// Implementations perform one credential exchange per call and classify
/// failures into `ExchangeError`. Timeouts and cancellation belong to the
/// implementation; the session manager imposes neither.
pub trait LoginExchange: Send + Sync {
    fn login<'a>(
        &'a self,
        request: LoginRequest<'a>,
    ) -> BoxFuture<'a, Result<LoginResponse, ExchangeError>>;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_full_shape() {
        let json = r#"{"token":"abc123","data":{"role":"admin"},"username":"alice"}"#;
        let resp: LoginResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.token.as_deref(), Some("abc123"));
        assert_eq!(resp.role(), Some("admin"));
        assert_eq!(resp.username.as_deref(), Some("alice"));
    }

    #[test]
    fn test_response_empty_object() {
        let resp: LoginResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.token.is_none());
        assert!(resp.role().is_none());
        assert!(resp.username.is_none());
    }

    #[test]
    fn test_response_ignores_unknown_fields() {
        let json = r#"{"token":"t","message":"welcome","data":{"id":7}}"#;
        let resp: LoginResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.token.as_deref(), Some("t"));
        assert!(resp.role().is_none());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let req = LoginRequest::new("alice", "hunter2");
        let out = format!("{:?}", req);
        assert!(out.contains("alice"));
        assert!(!out.contains("hunter2"));

        let resp: LoginResponse = serde_json::from_str(r#"{"token":"sekrit"}"#).unwrap();
        assert!(!format!("{:?}", resp).contains("sekrit"));
    }

    #[test]
    fn test_request_serializes_as_credential_pair() {
        let req = LoginRequest::new("bob", "secret");
        let value = serde_json::to_value(req).unwrap();
        assert_eq!(value, serde_json::json!({"username": "bob", "password": "secret"}));
    }
}
