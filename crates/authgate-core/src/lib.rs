//! Core library for authgate.
//!
//! Turns a username/password pair into a durable, app-wide session:
//!
//! - `api`: the remote login exchange and its HTTP implementation
//! - `store`: key/value credential persistence (keychain, file, memory)
//! - `auth`: the `SessionManager` that owns the session lifecycle
//! - `config`: on-disk configuration and store selection

pub mod api;
pub mod auth;
pub mod config;
pub mod store;

pub use api::{ApiClient, ExchangeError, LoginExchange, LoginRequest, LoginResponse};
pub use auth::{AuthError, Session, SessionManager, SessionState, Subscription};
pub use config::{Config, StorageBackend};
pub use store::{CredentialStore, FileStore, KeyringStore, MemoryStore, StorageError};
