//! Credential storage interface and implementations
//!
//! This module defines the key/value store that keeps the session identity,
//! with an in-memory (session-scoped) and a JSON file implementation.

use crate::error::{LobbyError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::debug;

/// Key holding the user id
pub const USER_ID_KEY: &str = "userId";
/// Key holding the user's email
pub const EMAIL_KEY: &str = "email";
/// Key holding the bearer token
pub const TOKEN_KEY: &str = "token";

/// Trait for credential storage operations
pub trait CredentialStore: Send + Sync {
    /// Get the value stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove every stored credential (logout / leave)
    fn clear(&self) -> Result<()>;
}

/// Credentials that live only as long as the process
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    values: RwLock<HashMap<String, String>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.read().map_err(|_| LobbyError::InternalError {
            message: "Failed to acquire credentials read lock".to_string(),
        })?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.write().map_err(|_| LobbyError::InternalError {
            message: "Failed to acquire credentials write lock".to_string(),
        })?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut values = self.values.write().map_err(|_| LobbyError::InternalError {
            message: "Failed to acquire credentials write lock".to_string(),
        })?;
        values.clear();
        Ok(())
    }
}

/// Credentials persisted as a flat JSON object on disk
///
/// Used by the CLI so that consecutive invocations share one identity.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    values: RwLock<HashMap<String, String>>,
}

impl FileCredentialStore {
    /// Open the store, loading existing values if the file exists
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                HashMap::new()
            } else {
                serde_json::from_str(&raw).map_err(|e| LobbyError::ConfigurationError {
                    message: format!("Corrupt credentials file {}: {}", path.display(), e),
                })?
            }
        } else {
            HashMap::new()
        };

        debug!(
            "Opened credentials file {} with {} entries",
            path.display(),
            values.len()
        );

        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let raw = serde_json::to_string_pretty(values)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.read().map_err(|_| LobbyError::InternalError {
            message: "Failed to acquire credentials read lock".to_string(),
        })?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.write().map_err(|_| LobbyError::InternalError {
            message: "Failed to acquire credentials write lock".to_string(),
        })?;
        values.insert(key.to_string(), value.to_string());
        self.persist(&values)
    }

    fn clear(&self) -> Result<()> {
        let mut values = self.values.write().map_err(|_| LobbyError::InternalError {
            message: "Failed to acquire credentials write lock".to_string(),
        })?;
        values.clear();
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}
