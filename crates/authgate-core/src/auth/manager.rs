//! Session lifecycle.
//!
//! `SessionManager` is the only writer of session state and of the
//! credential store. Pass one instance to whatever needs auth status;
//! there is no global.
//!
//! Guarantees:
//! - at most one login exchange in flight
//! - the store holds the token before anyone sees `Authenticated`
//! - a sign-out during a login discards that login's response
//!
//! Notifications are delivered after the state lock is released, so they are
//! ordered for a single cooperative caller, not across racing threads.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::api::{ExchangeError, LoginExchange, LoginRequest, LoginResponse};
use crate::store::CredentialStore;

use super::observers::{ObserverRegistry, Subscription};
use super::{AuthError, Session, SessionState};

struct Inner {
    state: SessionState,
    // Bumped by every sign-in attempt and sign-out; a login whose epoch no
    // longer matches has been superseded
    epoch: u64,
}

/// An in-flight sign-in. If its future is dropped before the exchange
/// returns, the attempt settles as `AuthError(Cancelled)` so the manager
/// does not stay `Authenticating`.
struct PendingAttempt<'a> {
    manager: &'a SessionManager,
    epoch: u64,
    settled: bool,
}

impl Drop for PendingAttempt<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let next = {
            let mut inner = self.manager.lock();
            if inner.epoch != self.epoch {
                // Already superseded by a sign-out
                return;
            }
            inner.epoch += 1;
            inner.state = SessionState::AuthError(AuthError::Cancelled);
            inner.state.clone()
        };
        info!("Sign-in abandoned by the caller, cancelled");
        self.manager.notify(&next);
    }
}

pub struct SessionManager {
    exchange: Arc<dyn LoginExchange>,
    store: Arc<dyn CredentialStore>,
    inner: Mutex<Inner>,
    observers: Arc<ObserverRegistry>,
}

impl SessionManager {
    /// Create a manager in the `Unauthenticated` state.
    /// Call `restore_session` at startup to pick up a persisted session.
    pub fn new(exchange: Arc<dyn LoginExchange>, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            exchange,
            store,
            inner: Mutex::new(Inner {
                state: SessionState::Unauthenticated,
                epoch: 0,
            }),
            observers: Arc::new(ObserverRegistry::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, state: &SessionState) {
        debug!(state = state.label(), "Session state changed");
        self.observers.notify(state);
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn current_state(&self) -> SessionState {
        self.lock().state.clone()
    }

    pub fn session(&self) -> Option<Session> {
        self.lock().state.session().cloned()
    }

    /// Bearer token for authenticated requests, if signed in
    pub fn token(&self) -> Option<String> {
        self.lock().state.session().map(|s| s.token.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock().state.is_authenticated()
    }

    /// Register a callback for every state transition.
    ///
    /// Callbacks run on the thread that made the transition, after the state
    /// lock is released. Delivery order matches transition order as long as
    /// transitions are driven from one task at a time; a `sign_out` racing a
    /// completing `sign_in` on another thread may be observed out of order,
    /// so read `current_state` when the latest value matters.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&SessionState) + Send + Sync + 'static,
    {
        self.observers.register(Arc::new(observer))
    }

    // =========================================================================
    // Sign in
    // =========================================================================

    /// Exchange credentials for a session.
    ///
    /// On success the session is persisted, then published as
    /// `Authenticated`. Failures leave the store untouched and park the state
    /// in `AuthError` until `clear_error` is called. Rejected calls
    /// (`InvalidInput`, `AlreadyInProgress`, `AlreadySignedIn`) do not change
    /// state.
    pub async fn sign_in(&self, username: &str, password: &str) -> Result<Session, AuthError> {
        let username = username.trim();
        if username.is_empty() || password.trim().is_empty() {
            debug!("Sign-in rejected: empty username or password");
            return Err(AuthError::InvalidInput);
        }

        let epoch = {
            let mut inner = self.lock();
            match inner.state {
                SessionState::Authenticating => {
                    debug!("Sign-in rejected: another attempt is in flight");
                    return Err(AuthError::AlreadyInProgress);
                }
                SessionState::Authenticated(_) => {
                    debug!("Sign-in rejected: already signed in");
                    return Err(AuthError::AlreadySignedIn);
                }
                SessionState::Unauthenticated | SessionState::AuthError(_) => {}
            }
            inner.epoch += 1;
            inner.state = SessionState::Authenticating;
            inner.epoch
        };
        let mut attempt = PendingAttempt {
            manager: self,
            epoch,
            settled: false,
        };
        self.notify(&SessionState::Authenticating);

        info!(username, "Signing in");
        let result = self
            .exchange
            .login(LoginRequest::new(username, password))
            .await;

        let (outcome, next) = {
            let mut inner = self.lock();
            attempt.settled = true;
            if inner.epoch != epoch {
                info!(username, "Discarding login response superseded by sign-out");
                return Err(AuthError::Cancelled);
            }
            let outcome = self.complete(result);
            inner.state = match &outcome {
                Ok(session) => SessionState::Authenticated(session.clone()),
                Err(e) => SessionState::AuthError(e.clone()),
            };
            (outcome, inner.state.clone())
        };
        self.notify(&next);

        match &outcome {
            Ok(session) => info!(username, role = ?session.role, "Login successful"),
            Err(e) => warn!(username, error = %e, "Login failed"),
        }
        outcome
    }

    /// Validate and persist a login response
    fn complete(&self, result: Result<LoginResponse, ExchangeError>) -> Result<Session, AuthError> {
        let response = result.map_err(|e| {
            warn!(error = %e, "Login exchange failed");
            AuthError::from(e)
        })?;

        let session = Session::from_response(&response).ok_or_else(|| {
            warn!(?response, "Login response carried no token");
            AuthError::UnexpectedResponse
        })?;

        session.save(self.store.as_ref())?;
        Ok(session)
    }

    /// Acknowledge a displayed error: `AuthError` becomes `Unauthenticated`.
    /// Returns whether there was an error to clear.
    pub fn clear_error(&self) -> bool {
        {
            let mut inner = self.lock();
            if !matches!(inner.state, SessionState::AuthError(_)) {
                return false;
            }
            inner.state = SessionState::Unauthenticated;
        }
        self.notify(&SessionState::Unauthenticated);
        true
    }

    // =========================================================================
    // Restore / sign out
    // =========================================================================

    /// Recover a persisted session at process start.
    ///
    /// The token is not validated against the backend; a stale token shows
    /// up later as a rejected request, which should lead to `invalidate`.
    pub fn restore_session(&self) -> Option<Session> {
        let session = {
            let mut inner = self.lock();
            if matches!(inner.state, SessionState::Authenticating) {
                debug!("Restore skipped: sign-in in progress");
                return None;
            }
            let Some(session) = Session::load(self.store.as_ref()) else {
                debug!("No stored session found");
                return None;
            };
            inner.state = SessionState::Authenticated(session.clone());
            session
        };
        info!(username = ?session.username, "Restored stored session");
        self.notify(&SessionState::Authenticated(session.clone()));
        Some(session)
    }

    /// Forget the session. Never fails: storage faults are logged and the
    /// in-memory state becomes `Unauthenticated` regardless. An in-flight
    /// login is cancelled.
    pub fn sign_out(&self) {
        let (previous, failures) = {
            let mut inner = self.lock();
            inner.epoch += 1;
            let failures = Session::clear(self.store.as_ref());
            let previous = std::mem::replace(&mut inner.state, SessionState::Unauthenticated);
            (previous, failures)
        };

        for e in &failures {
            warn!(key = %e.key, error = %e, "Failed to remove stored credential");
        }

        match previous {
            SessionState::Unauthenticated => {
                debug!("Sign-out while already signed out");
                return;
            }
            SessionState::Authenticating => info!("Signed out, in-flight login cancelled"),
            _ => info!("Signed out"),
        }
        self.notify(&SessionState::Unauthenticated);
    }

    /// Entry point for collaborators whose authenticated request was rejected
    pub fn invalidate(&self) {
        warn!("Backend rejected the session token, signing out");
        self.sign_out();
    }
}

// ============================================================================
// Tests
// ============================================================================
