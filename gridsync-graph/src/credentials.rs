//! Persisted OAuth credentials.
//!
//! The authorization-code exchange happens elsewhere; this module only needs
//! to read back what it produced and write refreshed tokens.

use crate::error::{GraphError, GraphResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::debug;

/// A stored bearer credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredential {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl StoredCredential {
    /// True if the token is already expired or will be within `buffer`.
    pub fn expires_within(&self, buffer: std::time::Duration) -> bool {
        match chrono::Duration::from_std(buffer)
            .ok()
            .and_then(|buffer| Utc::now().checked_add_signed(buffer))
        {
            Some(deadline) => deadline >= self.expires_at,
            None => true,
        }
    }
}

/// Where credentials are read from and written back to.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Returns the current credential, or `None` if the user never connected.
    async fn load(&self) -> GraphResult<Option<StoredCredential>>;

    /// Replaces the stored credential.
    async fn save(&self, credential: &StoredCredential) -> GraphResult<()>;
}

/// In-process store, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credential: RwLock<Option<StoredCredential>>,
}

impl MemoryCredentialStore {
    pub fn new(credential: StoredCredential) -> Self {
        Self {
            credential: RwLock::new(Some(credential)),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self) -> GraphResult<Option<StoredCredential>> {
        Ok(self.credential.read().await.clone())
    }

    async fn save(&self, credential: &StoredCredential) -> GraphResult<()> {
        *self.credential.write().await = Some(credential.clone());
        Ok(())
    }
}

/// JSON file on disk, replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> GraphResult<Option<StoredCredential>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(GraphError::Credentials(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )));
            }
        };
        let credential = serde_json::from_slice(&bytes)?;
        Ok(Some(credential))
    }

    async fn save(&self, credential: &StoredCredential) -> GraphResult<()> {
        let json = serde_json::to_vec_pretty(credential)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&path, &json))
            .await
            .map_err(|e| GraphError::Credentials(format!("credential write task failed: {e}")))??;
        debug!(path = %self.path.display(), "Persisted refreshed credential");
        Ok(())
    }
}

/// Writes to a sibling temp file, then renames it over `path`.
fn write_atomically(path: &Path, contents: &[u8]) -> GraphResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let io_err = |e: std::io::Error| {
        GraphError::Credentials(format!("failed to write {}: {e}", path.display()))
    };

    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(io_err)?;
    tmp.write_all(contents).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}
