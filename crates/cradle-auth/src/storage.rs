//! Secure key-value storage for persisted credentials.
//!
//! The store treats the backend as an opaque async key-value holder. The
//! file-backed implementation writes `<data_dir>/credentials.json` with
//! permissions 0o600; a missing or corrupt file reads as empty.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::errors::Result;

/// Credential file name under the data directory.
const CREDENTIAL_FILE_NAME: &str = "credentials.json";

/// Opaque async key-value storage.
#[async_trait]
pub trait SecureStorage: Send + Sync {
    /// Read a value, `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<String>>;
    /// Write a value.
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Delete a value; absent keys are not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}

/// File-backed secure storage: one JSON object per data directory.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Create storage rooted at the given data directory.
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(CREDENTIAL_FILE_NAME),
        }
    }

    /// Read the whole map. Missing or unparseable files read as empty.
    async fn read_map(&self) -> HashMap<String, String> {
        let data = match tokio::fs::read_to_string(&self.path).await {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return HashMap::new(),
            Err(e) => {
                tracing::warn!("failed to read credential file: {e}");
                return HashMap::new();
            }
        };
        match serde_json::from_str(&data) {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!("failed to parse credential file: {e}");
                HashMap::new()
            }
        }
    }

    /// Write the whole map. Creates parent directories, sets 0o600.
    async fn write_map(&self, map: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(map)?;
        tokio::fs::write(&self.path, &json).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = tokio::fs::set_permissions(&self.path, perms).await;
        }

        Ok(())
    }
}

#[async_trait]
impl SecureStorage for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_map().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut map = self.read_map().await;
        let _ = map.insert(key.to_string(), value.to_string());
        self.write_map(&map).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut map = self.read_map().await;
        if map.remove(key).is_some() {
            self.write_map(&map).await?;
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
