use ::keyring::{Entry, Error as KeyringError};
use tracing::warn;

use super::{CredentialStore, StorageError};

const SERVICE_NAME: &str = "authgate";

/// Session fields in the OS keychain, one entry per key under a shared service.
#[derive(Debug, Clone)]
pub struct KeyringStore {
    service: String,
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyringStore {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    /// Use a custom keychain service name, e.g. to keep profiles apart
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    fn entry(&self, key: &str) -> Result<Entry, KeyringError> {
        Entry::new(&self.service, key)
    }
}

impl CredentialStore for KeyringStore {
    /// Store a value in the OS keychain
    fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entry(key)
            .and_then(|entry| entry.set_password(value))
            .map_err(|e| StorageError::new(key, e))
    }

    /// Retrieve a value from the OS keychain
    fn get(&self, key: &str) -> Option<String> {
        match self.entry(key).and_then(|entry| entry.get_password()) {
            Ok(value) => Some(value),
            Err(KeyringError::NoEntry) => None,
            Err(e) => {
                warn!(key, error = %e, "Failed to read keychain entry");
                None
            }
        }
    }

    /// Delete a keychain entry
    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match self.entry(key).and_then(|entry| entry.delete_credential()) {
            Ok(()) | Err(KeyringError::NoEntry) => Ok(()),
            Err(e) => Err(StorageError::new(key, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TOKEN_KEY;

    /// Service name private to this test run
    fn scratch_service(name: &str) -> String {
        format!("authgate-test-{}-{}", name, std::process::id())
    }

    #[test]
    fn test_put_then_get_round_trip() {
        let store = KeyringStore::with_service(scratch_service("round-trip"));
        if let Err(e) = store.put(TOKEN_KEY, "abc123") {
            eprintln!("skipping: no usable OS keychain ({})", e);
            return;
        }

        assert_eq!(store.get(TOKEN_KEY).as_deref(), Some("abc123"));
        // A fresh handle sees the same entry, as after a restart
        let reopened = KeyringStore::with_service(store.service());
        assert_eq!(reopened.get(TOKEN_KEY).as_deref(), Some("abc123"));

        store.remove(TOKEN_KEY).unwrap();
        assert!(reopened.get(TOKEN_KEY).is_none());
    }

    #[test]
    fn test_missing_entry_reads_as_absent() {
        let store = KeyringStore::with_service(scratch_service("missing"));
        assert!(store.get(TOKEN_KEY).is_none());
        if let Err(e) = store.remove(TOKEN_KEY) {
            eprintln!("skipping remove check: no usable OS keychain ({})", e);
        }
    }

    #[test]
    fn test_default_service_name() {
        assert_eq!(KeyringStore::new().service(), "authgate");
    }
}
