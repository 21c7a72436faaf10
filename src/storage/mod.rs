pub mod file_store;
pub mod keyring_store;
pub mod memory_store;
pub mod store_trait;

pub use file_store::FileStore;
pub use keyring_store::KeyringStore;
pub use memory_store::MemoryStore;
pub use store_trait::KeyValueStore;

use log::info;
use std::sync::Arc;

use crate::config::{RuntimeConfig, StorageBackend};
use crate::error::AppResult;

/// Builds the configured durable store.
pub fn open_store(config: &RuntimeConfig) -> AppResult<Arc<dyn KeyValueStore>> {
    let store: Arc<dyn KeyValueStore> = match config.storage_backend {
        StorageBackend::File => {
            let store = FileStore::in_dir(&config.resolve_storage_dir()?);
            info!("Persisting credentials in {}", store.path().display());
            Arc::new(store)
        }
        StorageBackend::Keyring => {
            info!("Persisting credentials in the OS keyring");
            Arc::new(KeyringStore::default())
        }
        StorageBackend::Memory => {
            info!("Credentials kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };
    Ok(store)
}
