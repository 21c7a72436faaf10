use async_trait::async_trait;
use log::{debug, error, warn};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::store_trait::KeyValueStore;
use crate::constants::STORAGE_FILE_NAME;
use crate::error::{AppError, AppResult};

/// JSON file holding one flat string map, rewritten atomically on change.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within the process
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(STORAGE_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> AppResult<BTreeMap<String, String>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(map) => Ok(map),
                Err(e) => {
                    // A corrupt store must not lock the user out; start clean.
                    warn!(
                        "FileStore: {} is not a valid store ({}), treating as empty",
                        self.path.display(),
                        e
                    );
                    Ok(BTreeMap::new())
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => {
                error!("FileStore: failed to read {}: {}", self.path.display(), e);
                Err(AppError::StorageError(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        }
    }

    async fn persist(&self, map: &BTreeMap<String, String>) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AppError::StorageError(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let bytes = serde_json::to_vec_pretty(map)?;
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, bytes).await.map_err(|e| {
            AppError::StorageError(format!("Failed to write {}: {}", tmp_path.display(), e))
        })?;
        tokio::fs::rename(&tmp_path, &self.path).await.map_err(|e| {
            AppError::StorageError(format!("Failed to replace {}: {}", self.path.display(), e))
        })
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn set_item(&self, key: &str, value: &str) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.load().await?;
        map.insert(key.to_string(), value.to_string());
        self.persist(&map).await?;
        debug!("FileStore: saved {}", key);
        Ok(())
    }

    async fn get_item(&self, key: &str) -> AppResult<Option<String>> {
        let _guard = self.write_lock.lock().await;
        Ok(self.load().await?.remove(key))
    }

    async fn remove_item(&self, key: &str) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.load().await?;
        if map.remove(key).is_none() {
            debug!("FileStore: {} already absent", key);
            return Ok(());
        }
        self.persist(&map).await?;
        debug!("FileStore: removed {}", key);
        Ok(())
    }
}
