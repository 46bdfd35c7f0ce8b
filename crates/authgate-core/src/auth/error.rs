use thiserror::Error;

use crate::api::ExchangeError;
use crate::store::StorageError;

/// Why a sign-in did not produce a session.
///
/// Carried inside `SessionState::AuthError`, hence `Clone + PartialEq`.
/// Callers pick their own presentation per variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Username and password required")]
    InvalidInput,

    #[error("Credentials rejected")]
    InvalidCredentials,

    #[error("Unexpected server response")]
    UnexpectedResponse,

    #[error("Login request timed out")]
    Timeout,

    #[error("Login cancelled")]
    Cancelled,

    #[error("Another login is already in progress")]
    AlreadyInProgress,

    #[error("Already signed in")]
    AlreadySignedIn,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<ExchangeError> for AuthError {
    fn from(err: ExchangeError) -> Self {
        match err {
            ExchangeError::Rejected { .. }
            | ExchangeError::RateLimited
            | ExchangeError::ServerError(_)
            | ExchangeError::Network(_) => AuthError::InvalidCredentials,
            ExchangeError::InvalidResponse(_) => AuthError::UnexpectedResponse,
            ExchangeError::Timeout => AuthError::Timeout,
            ExchangeError::Cancelled => AuthError::Cancelled,
        }
    }
}
