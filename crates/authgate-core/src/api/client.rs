//! HTTP client for the remote login endpoint.
//!
//! This module provides the `ApiClient` struct, the production
//! `LoginExchange`: one JSON POST per sign-in attempt.

use std::time::Duration;

use anyhow::{Context, Result};
use futures::future::{BoxFuture, FutureExt};
use reqwest::{header, Client};
use tracing::{debug, warn};

use super::{ExchangeError, LoginExchange, LoginRequest, LoginResponse};

// ============================================================================
// Constants
// ============================================================================

/// Path of the login endpoint, relative to the configured base URL
const LOGIN_PATH: &str = "/api/auth/login";

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Login API client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client for the given backend
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    /// Create a client with a custom request timeout
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn login_url(&self) -> String {
        format!("{}{}", self.base_url, LOGIN_PATH)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ExchangeError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ExchangeError::from_status(status, &body))
        }
    }

    /// Exchange a credential pair for the backend's login response
    pub async fn authenticate(
        &self,
        request: LoginRequest<'_>,
    ) -> Result<LoginResponse, ExchangeError> {
        let url = self.login_url();
        debug!(url = %url, username = request.username, "Sending login request");

        let response = self
            .client
            .post(&url)
            .header(header::ACCEPT, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Login request failed");
                ExchangeError::from(e)
            })?;

        let response = Self::check_response(response).await?;
        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| {
            warn!(error = %e, "Login response is not a JSON object");
            ExchangeError::InvalidResponse(e.to_string())
        })
    }
}

impl LoginExchange for ApiClient {
    fn login<'a>(
        &'a self,
        request: LoginRequest<'a>,
    ) -> BoxFuture<'a, Result<LoginResponse, ExchangeError>> {
        self.authenticate(request).boxed()
    }
}

// ============================================================================
// Tests
// ============================================================================
