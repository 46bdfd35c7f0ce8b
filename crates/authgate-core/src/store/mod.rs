//! Durable key/value storage for session fields.
//!
//! This module provides the `CredentialStore` trait and three backends:
//! - `KeyringStore`: OS keychain, one entry per key
//! - `FileStore`: a JSON object file in the data directory
//! - `MemoryStore`: process-local map for tests and throwaway sessions
//!
//! Stores hold strings and never interpret them. Each operation is atomic
//! for its own key; there is no cross-key transaction.

use std::fmt::Display;

use thiserror::Error;

pub mod file;
pub mod keyring;
pub mod memory;

pub use self::file::FileStore;
pub use self::keyring::KeyringStore;
pub use self::memory::MemoryStore;

/// Key holding the bearer token. Present only while a session is active.
pub const TOKEN_KEY: &str = "token";
/// Key holding the optional authorization role.
pub const ROLE_KEY: &str = "role";
/// Key holding the optional display username.
pub const USERNAME_KEY: &str = "username";

/// Every key the session manager writes, token first.
pub const SESSION_KEYS: [&str; 3] = [TOKEN_KEY, ROLE_KEY, USERNAME_KEY];

/// The persistence medium refused a write or remove.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("credential storage failed for `{key}`: {message}")]
pub struct StorageError {
    pub key: String,
    pub message: String,
}

impl StorageError {
    pub fn new(key: &str, cause: impl Display) -> Self {
        Self {
            key: key.to_string(),
            message: cause.to_string(),
        }
    }
}

pub trait CredentialStore: Send + Sync {
    /// Store `value` under `key`, replacing any previous value
    fn put(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Read the value under `key`; `None` if never set or removed
    fn get(&self, key: &str) -> Option<String>;

    /// Delete `key`; succeeds when it is already absent
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
