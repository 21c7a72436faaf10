use async_trait::async_trait;
use keyring::{Entry, Error as KeyringError};
use log::{debug, error};

use super::store_trait::KeyValueStore;
use crate::constants::KEYRING_SERVICE_NAME;
use crate::error::{AppError, AppResult};

/// OS keyring backend. Each key is its own keyring account under one
/// service name.
#[derive(Debug, Clone)]
pub struct KeyringStore {
    service: String,
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new(KEYRING_SERVICE_NAME)
    }
}

impl KeyringStore {
    pub fn new(service: &str) -> Self {
        Self {
            service: service.to_string(),
        }
    }

    fn entry(&self, key: &str) -> AppResult<Entry> {
        Entry::new(&self.service, key).map_err(|e| {
            error!("Failed to create keyring entry - OS: {:?}, Error: {}", std::env::consts::OS, e);
            AppError::KeyringError(format!("Failed to create keyring entry: {e}"))
        })
    }
}

#[async_trait]
impl KeyValueStore for KeyringStore {
    async fn set_item(&self, key: &str, value: &str) -> AppResult<()> {
        self.entry(key)?.set_password(value).map_err(|e| {
            error!("Failed to store {} in keyring - OS: {:?}, Error: {}", key, std::env::consts::OS, e);
            AppError::KeyringError(format!("Failed to store {key}: {e}"))
        })?;
        debug!("{} saved to keyring", key);
        Ok(())
    }

    async fn get_item(&self, key: &str) -> AppResult<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(KeyringError::NoEntry) => {
                debug!("No keyring entry for {}", key);
                Ok(None)
            }
            Err(e) => {
                error!("Keyring error - OS: {:?}, Details: {}", std::env::consts::OS, e);
                Err(AppError::KeyringError(format!("Failed to read {key}: {e}")))
            }
        }
    }

    async fn remove_item(&self, key: &str) -> AppResult<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) => {
                debug!("{} cleared from keyring", key);
                Ok(())
            }
            Err(KeyringError::NoEntry) => {
                debug!("No {} found to clear in keyring (already empty)", key);
                Ok(())
            }
            Err(e) => {
                error!("Failed to clear {} from keyring: {}", key, e);
                Err(AppError::KeyringError(format!("Failed to clear {key}: {e}")))
            }
        }
    }
}
