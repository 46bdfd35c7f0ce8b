//! Authentication module for managing the user session.
//!
//! This module provides:
//! - `Session` / `SessionState`: the authenticated identity and its lifecycle
//! - `SessionManager`: sign-in, restore, sign-out and state observers
//! - `AuthError`: why a sign-in did not produce a session
//!
//! Sessions are persisted through a `CredentialStore` and survive restarts
//! until signed out.

pub mod error;
pub mod manager;
pub mod observers;
pub mod session;

pub use error::AuthError;
pub use manager::SessionManager;
pub use observers::{Observer, Subscription};
pub use session::{Session, SessionState};
