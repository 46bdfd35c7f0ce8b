use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use super::{CredentialStore, StorageError};

/// Session file name in the data directory
pub const SESSION_FILE: &str = "session.json";

/// Credential store backed by a single JSON object file.
///
/// Every mutation rewrites the whole file through a sibling temp file and a
/// rename, so a crash leaves either the old or the new map on disk.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Store at `<dir>/session.json`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(SESSION_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the map from disk. A missing file is an empty map.
    fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = fs::read_to_string(&self.path).context("Failed to read session file")?;
        serde_json::from_str(&contents).context("Failed to parse session file")
    }

    /// An unreadable file reads as empty; the next write replaces it.
    fn load_or_empty(&self) -> BTreeMap<String, String> {
        self.load().unwrap_or_else(|e| {
            warn!(path = ?self.path, error = %e, "Session file unreadable, treating as empty");
            BTreeMap::new()
        })
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("Failed to create data directory")?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let contents = serde_json::to_string_pretty(entries)?;
        fs::write(&tmp, contents).context("Failed to write session file")?;

        // Restrict to owner before the file becomes visible
        #[cfg(unix)]
        {
            let mut perms = fs::metadata(&tmp)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&tmp, perms)?;
        }

        fs::rename(&tmp, &self.path).context("Failed to replace session file")?;
        Ok(())
    }

    fn update<F>(&self, key: &str, f: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> bool,
    {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.load_or_empty();
        if f(&mut entries) {
            self.save(&entries)
                .map_err(|e| StorageError::new(key, format!("{:#}", e)))?;
        }
        Ok(())
    }
}

impl CredentialStore for FileStore {
    fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(key, |entries| {
            entries.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn get(&self, key: &str) -> Option<String> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.load_or_empty().remove(key)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.update(key, |entries| {
            let removed = entries.remove(key).is_some();
            if !removed {
                debug!(key, "Key already absent from session file");
            }
            removed
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
