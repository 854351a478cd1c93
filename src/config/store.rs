//! Config persistence
//!
//! The credential manager writes refreshed tokens back through a
//! `ConfigStore`. The file store rewrites the whole config object using a
//! temp file and rename; a mutex serializes writers.

use super::types::MedusaConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;
use tracing::debug;

/// Durable home of the tap configuration
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Current configuration, including the cached credentials
    async fn snapshot(&self) -> MedusaConfig;

    /// Record a refreshed token and persist the whole configuration
    async fn save_credentials(&self, token: &str, expires_at: DateTime<Utc>) -> Result<()>;
}

/// JSON file backed config store
#[derive(Debug)]
pub struct FileConfigStore {
    /// Path to the config file
    path: PathBuf,
    /// Last loaded or written config
    config: Mutex<MedusaConfig>,
}

impl FileConfigStore {
    /// Load the config file at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let contents = std::fs::read_to_string(&path).map_err(|e| {
            Error::store(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        let config: MedusaConfig = serde_json::from_str(&contents).map_err(|e| {
            Error::store(format!("Failed to parse config file {}: {e}", path.display()))
        })?;

        Ok(Self {
            path,
            config: Mutex::new(config),
        })
    }

    /// Create a store for `path` seeded with an in-memory config
    ///
    /// Nothing is written until the first credential save.
    pub fn new(path: impl AsRef<Path>, config: MedusaConfig) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            config: Mutex::new(config),
        }
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write(&self, config: &MedusaConfig) -> Result<()> {
        let contents = serde_json::to_string_pretty(config)
            .map_err(|e| Error::store(format!("Failed to serialize config: {e}")))?;

        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents)
            .await
            .map_err(|e| Error::store(format!("Failed to write config file: {e}")))?;

        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| Error::store(format!("Failed to rename config file: {e}")))?;

        Ok(())
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn snapshot(&self) -> MedusaConfig {
        self.config.lock().await.clone()
    }

    async fn save_credentials(&self, token: &str, expires_at: DateTime<Utc>) -> Result<()> {
        let mut config = self.config.lock().await;
        let mut updated = config.clone();
        updated.set_credentials(token, expires_at);

        self.write(&updated).await?;
        *config = updated;

        debug!(path = %self.path.display(), "Persisted refreshed access token");
        Ok(())
    }
}

/// In-memory config store (no file persistence)
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    config: Mutex<MedusaConfig>,
    saves: AtomicUsize,
}

impl MemoryConfigStore {
    /// Create a store holding `config`
    pub fn new(config: MedusaConfig) -> Self {
        Self {
            config: Mutex::new(config),
            saves: AtomicUsize::new(0),
        }
    }

    /// Number of credential saves so far
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn snapshot(&self) -> MedusaConfig {
        self.config.lock().await.clone()
    }

    async fn save_credentials(&self, token: &str, expires_at: DateTime<Utc>) -> Result<()> {
        self.config.lock().await.set_credentials(token, expires_at);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
