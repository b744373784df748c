//! Key/value storage used for session persistence.
//!
//! The session store only needs a `get`/`set`/`remove` contract. Durable
//! state (the session blob) goes to a [`FileStorage`]; ephemeral state (the
//! pending OAuth state, the post-login redirect) goes wherever the caller
//! keeps short-lived values, usually a [`MemoryStorage`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{AuthError, Result};

/// Storage key for the persisted session blob.
pub const SESSION_KEY: &str = "asana_auth";

/// Storage key for the pending OAuth state.
pub const OAUTH_STATE_KEY: &str = "oauth_state";

/// Storage key for the path to return to after login.
pub const REDIRECT_KEY: &str = "redirect_after_login";

// ============================================================================
// Storage Trait
// ============================================================================

/// A string key/value store.
pub trait Storage: Send + Sync + std::fmt::Debug {
    /// Read a value. Missing keys are `Ok(None)`.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// Read and remove in one step.
    fn take(&self, key: &str) -> Result<Option<String>> {
        let value = self.get(key)?;
        self.remove(key)?;
        Ok(value)
    }
}

// ============================================================================
// FileStorage
// ============================================================================

/// File-backed storage: one `<key>.json` file per key inside a directory.
#[derive(Debug)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Create storage rooted at `dir`. The directory is created on first write.
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    /// The directory holding the stored files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`.
    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(AuthError::Storage(format!("invalid storage key '{}'", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }
        std::fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| AuthError::Storage(format!("Failed to read {}: {}", path.display(), e)))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            AuthError::Storage(format!("Failed to create storage directory: {}", e))
        })?;
        std::fs::write(&path, value)
            .map_err(|e| AuthError::Storage(format!("Failed to write {}: {}", path.display(), e)))?;
        tracing::debug!(key, path = %path.display(), "Stored value");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        if path.exists() {
            std::fs::remove_file(&path).map_err(|e| {
                AuthError::Storage(format!("Failed to delete {}: {}", path.display(), e))
            })?;
        }
        Ok(())
    }
}

// ============================================================================
// MemoryStorage
// ============================================================================

/// Process-scoped storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.lock().is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values.lock().remove(key);
        Ok(())
    }

    fn take(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().remove(key))
    }
}

// ============================================================================
// Shared Storage
// ============================================================================

/// Shared storage handle for use across async contexts.
pub type SharedStorage = Arc<dyn Storage>;

/// Create shared file-backed storage.
pub fn create_file_storage(dir: &Path) -> SharedStorage {
    Arc::new(FileStorage::new(dir))
}

/// Create shared in-memory storage.
pub fn create_memory_storage() -> SharedStorage {
    Arc::new(MemoryStorage::new())
}
