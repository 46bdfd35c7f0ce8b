use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    #[error("Login rejected (status {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Login request timed out")]
    Timeout,

    #[error("Login request cancelled")]
    Cancelled,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ExchangeError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            429 => ExchangeError::RateLimited,
            500..=599 => ExchangeError::ServerError(truncated),
            code => ExchangeError::Rejected {
                status: code,
                body: truncated,
            },
        }
    }
}

impl From<reqwest::Error> for ExchangeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ExchangeError::Timeout
        } else if err.is_decode() {
            ExchangeError::InvalidResponse(err.to_string())
        } else {
            ExchangeError::Network(err.to_string())
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_unauthorized_is_rejection() {
        let err = ExchangeError::from_status(StatusCode::UNAUTHORIZED, "bad password");
        assert_eq!(
            err,
            ExchangeError::Rejected {
                status: 401,
                body: "bad password".to_string()
            }
        );
    }

    #[test]
    fn test_from_status_classes() {
        assert_eq!(
            ExchangeError::from_status(StatusCode::TOO_MANY_REQUESTS, ""),
            ExchangeError::RateLimited
        );
        assert!(matches!(
            ExchangeError::from_status(StatusCode::BAD_GATEWAY, "upstream"),
            ExchangeError::ServerError(_)
        ));
        assert!(matches!(
            ExchangeError::from_status(StatusCode::NOT_FOUND, ""),
            ExchangeError::Rejected { status: 404, .. }
        ));
    }

    #[test]
    fn test_truncate_body() {
        let long = "x".repeat(MAX_ERROR_BODY_LENGTH + 10);
        let out = ExchangeError::truncate_body(&long);
        assert!(out.starts_with(&"x".repeat(MAX_ERROR_BODY_LENGTH)));
        assert!(out.contains("510 total bytes"));

        assert_eq!(ExchangeError::truncate_body("short"), "short");
    }

    #[test]
    fn test_truncate_body_respects_char_boundaries() {
        // 'é' is two bytes, so byte 500 falls mid-character
        let body = format!("a{}", "é".repeat(300));
        let out = ExchangeError::truncate_body(&body);
        assert!(out.contains("truncated"));
    }
}
