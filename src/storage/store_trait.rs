use crate::error::AppResult;
use async_trait::async_trait;
use std::fmt::Debug;

/// Durable string key/value storage for credentials.
///
/// Removing a key that does not exist is not an error.
#[async_trait]
pub trait KeyValueStore: Send + Sync + Debug {
    async fn set_item(&self, key: &str, value: &str) -> AppResult<()>;
    async fn get_item(&self, key: &str) -> AppResult<Option<String>>;
    async fn remove_item(&self, key: &str) -> AppResult<()>;
}
