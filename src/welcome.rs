//! Per-user "welcomed" flag storage.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info};
use tokio::{io::AsyncWriteExt, sync::RwLock};

use crate::error::Result;

/// Key-value store for the welcomed flag, keyed by user id.
#[async_trait]
pub trait WelcomeStore: Send + Sync {
    async fn is_welcomed(&self, user_id: &str) -> Result<bool>;

    async fn mark_welcomed(&self, user_id: &str) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct InMemoryWelcomeStore {
    welcomed: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl InMemoryWelcomeStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WelcomeStore for InMemoryWelcomeStore {
    async fn is_welcomed(&self, user_id: &str) -> Result<bool> {
        Ok(self.welcomed.read().await.contains_key(user_id))
    }

    async fn mark_welcomed(&self, user_id: &str) -> Result<()> {
        self.welcomed
            .write()
            .await
            .entry(user_id.to_string())
            .or_insert_with(Utc::now);
        Ok(())
    }
}

/// Welcomed flags persisted as a JSON object of `user id -> time welcomed`.
#[derive(Debug)]
pub struct JsonFileWelcomeStore {
    path: PathBuf,
    welcomed: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl JsonFileWelcomeStore {
    /// Open the store, starting empty if the file does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read or parsed.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let welcomed = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No welcome state at {}, starting empty", path.display());
                HashMap::new()
            }
            Err(e) => return Err(e.into()),
        };

        info!(
            "Loaded welcome state from {} ({} users)",
            path.display(),
            welcomed.len()
        );
        Ok(Self {
            path,
            welcomed: RwLock::new(welcomed),
        })
    }

    /// Replace the file with `welcomed` via a synced temp file and a rename.
    async fn save(&self, welcomed: &HashMap<String, DateTime<Utc>>) -> Result<()> {
        let json = serde_json::to_string_pretty(welcomed)?;

        let temp_path = self.path.with_extension("json.tmp");
        let mut file = tokio::fs::File::create(&temp_path).await?;
        file.write_all(json.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&temp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl WelcomeStore for JsonFileWelcomeStore {
    async fn is_welcomed(&self, user_id: &str) -> Result<bool> {
        Ok(self.welcomed.read().await.contains_key(user_id))
    }

    async fn mark_welcomed(&self, user_id: &str) -> Result<()> {
        let mut welcomed = self.welcomed.write().await;
        if welcomed.contains_key(user_id) {
            return Ok(());
        }

        // Only flags that reached disk go into the map, so a failed save is retried.
        let mut updated = welcomed.clone();
        let now = Utc::now();
        updated.insert(user_id.to_string(), now);
        self.save(&updated).await?;

        welcomed.insert(user_id.to_string(), now);
        debug!("Persisted welcome flag for {user_id}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_flag_round_trip() {
        let store = InMemoryWelcomeStore::new();
        assert!(!store.is_welcomed("u1").await.unwrap());
        store.mark_welcomed("u1").await.unwrap();
        assert!(store.is_welcomed("u1").await.unwrap());
        assert!(!store.is_welcomed("u2").await.unwrap());
    }

    #[tokio::test]
    async fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("welcome.json");

        let store = JsonFileWelcomeStore::open(&path).await.unwrap();
        assert!(!store.is_welcomed("u1").await.unwrap());
        store.mark_welcomed("u1").await.unwrap();
        drop(store);

        let reopened = JsonFileWelcomeStore::open(&path).await.unwrap();
        assert!(reopened.is_welcomed("u1").await.unwrap());
        assert!(!reopened.is_welcomed("u2").await.unwrap());
    }

    #[tokio::test]
    async fn failed_save_is_retried_on_next_call() {
        let dir = tempfile::tempdir().unwrap();
        let state_dir = dir.path().join("state");
        let path = state_dir.join("welcome.json");

        let store = JsonFileWelcomeStore::open(&path).await.unwrap();
        assert!(store.mark_welcomed("u1").await.is_err());
        assert!(!store.is_welcomed("u1").await.unwrap());

        tokio::fs::create_dir(&state_dir).await.unwrap();
        store.mark_welcomed("u1").await.unwrap();
        assert!(store.is_welcomed("u1").await.unwrap());
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());

        let reopened = JsonFileWelcomeStore::open(&path).await.unwrap();
        assert!(reopened.is_welcomed("u1").await.unwrap());
    }

    #[tokio::test]
    async fn saves_keep_earlier_users() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("welcome.json");

        let store = JsonFileWelcomeStore::open(&path).await.unwrap();
        store.mark_welcomed("u1").await.unwrap();
        store.mark_welcomed("u2").await.unwrap();

        let raw = tokio::fs::read_to_string(&path).await.unwrap();
        let saved: HashMap<String, DateTime<Utc>> = serde_json::from_str(&raw).unwrap();
        assert_eq!(saved.len(), 2);
    }

    #[tokio::test]
    async fn file_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("welcome.json");
        tokio::fs::write(&path, "not json").await.unwrap();

        assert!(JsonFileWelcomeStore::open(&path).await.is_err());
    }
}
