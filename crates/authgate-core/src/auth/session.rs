use std::fmt;

use tracing::warn;

use crate::api::LoginResponse;
use crate::store::{CredentialStore, StorageError, ROLE_KEY, SESSION_KEYS, TOKEN_KEY, USERNAME_KEY};

use super::AuthError;

/// The authenticated identity held by the client.
///
/// Only constructed with a non-empty token.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub role: Option<String>,
    pub username: Option<String>,
}

// Keep the bearer token out of logs
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[REDACTED]")
            .field("role", &self.role)
            .field("username", &self.username)
            .finish()
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
}

impl Session {
    /// Build a session from a login response; `None` without a usable token
    pub fn from_response(response: &LoginResponse) -> Option<Self> {
        let token = non_blank(response.token.as_deref())?;
        Some(Self {
            token,
            role: non_blank(response.role()),
            username: non_blank(response.username.as_deref()),
        })
    }

    /// Load a previously persisted session. Role and username are best-effort.
    pub fn load(store: &dyn CredentialStore) -> Option<Self> {
        let token = non_blank(store.get(TOKEN_KEY).as_deref())?;
        Some(Self {
            token,
            role: non_blank(store.get(ROLE_KEY).as_deref()),
            username: non_blank(store.get(USERNAME_KEY).as_deref()),
        })
    }

    /// Persist the session, token first.
    ///
    /// Keys this session lacks are removed so a previous account's display
    /// fields cannot leak into a later restore. If an optional field fails
    /// to persist, the token is rolled back and the error returned: a token
    /// on disk always belongs to a fully written session.
    pub fn save(&self, store: &dyn CredentialStore) -> Result<(), AuthError> {
        store.put(TOKEN_KEY, &self.token)?;

        for (key, value) in [(ROLE_KEY, &self.role), (USERNAME_KEY, &self.username)] {
            let result = match value {
                Some(v) => store.put(key, v),
                None => {
                    if let Err(e) = store.remove(key) {
                        warn!(key, error = %e, "Failed to remove stale session field");
                    }
                    Ok(())
                }
            };

            if let Err(e) = result {
                if let Err(rollback) = store.remove(TOKEN_KEY) {
                    warn!(error = %rollback, "Failed to roll back token after partial write");
                }
                return Err(e.into());
            }
        }
        Ok(())
    }

    /// Remove every session key, attempting all of them.
    /// Returns the failures; the caller decides whether they matter.
    pub fn clear(store: &dyn CredentialStore) -> Vec<StorageError> {
        SESSION_KEYS
            .iter()
            .filter_map(|key| store.remove(key).err())
            .collect()
    }
}

/// Lifecycle status exposed to the rest of the application.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Authenticating,
    Authenticated(Session),
    AuthError(AuthError),
}

impl SessionState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    /// Short name for logs
    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Unauthenticated => "unauthenticated",
            SessionState::Authenticating => "authenticating",
            SessionState::Authenticated(_) => "authenticated",
            SessionState::AuthError(_) => "auth_error",
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
