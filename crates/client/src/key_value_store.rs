//! Client-local string key-value persistence.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use opsdesk_core::{AppError, AppResult};
use tokio::sync::RwLock;

/// Storage port for client-local state.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: String) -> AppResult<()>;

    /// Removes `key`. Removing a missing key succeeds.
    async fn remove(&self, key: &str) -> AppResult<()>;
}

/// Process-local store. State is lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryKeyValueStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> AppResult<()> {
        self.entries.write().await.insert(key.to_owned(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// Store persisted as a JSON object on disk, surviving restarts.
///
/// Every mutation rewrites the file through a sibling temporary file and a rename.
#[derive(Debug)]
pub struct JsonFileKeyValueStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl JsonFileKeyValueStore {
    /// Opens the store at `path`, starting empty when the file does not exist.
    pub async fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(document) => serde_json::from_str(&document).map_err(|error| {
                AppError::Internal(format!(
                    "failed to parse client state '{}': {error}",
                    path.display()
                ))
            })?,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(error) => {
                return Err(AppError::Internal(format!(
                    "failed to read client state '{}': {error}",
                    path.display()
                )));
            }
        };

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    async fn persist(&self, entries: &BTreeMap<String, String>) -> AppResult<()> {
        let document = serde_json::to_string_pretty(entries).map_err(|error| {
            AppError::Internal(format!("failed to serialize client state: {error}"))
        })?;

        let temporary = self.path.with_extension("tmp");
        tokio::fs::write(&temporary, document)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to write client state '{}': {error}",
                    temporary.display()
                ))
            })?;

        tokio::fs::rename(&temporary, &self.path)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to replace client state '{}': {error}",
                    self.path.display()
                ))
            })
    }
}

#[async_trait]
impl KeyValueStore for JsonFileKeyValueStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> AppResult<()> {
        let mut entries = self.entries.write().await;
        let mut next = entries.clone();
        next.insert(key.to_owned(), value);

        self.persist(&next).await?;
        *entries = next;
        Ok(())
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        let mut entries = self.entries.write().await;
        if !entries.contains_key(key) {
            return Ok(());
        }

        let mut next = entries.clone();
        next.remove(key);

        self.persist(&next).await?;
        *entries = next;
        Ok(())
    }
}
