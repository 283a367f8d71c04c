use async_trait::async_trait;
use beacon_core::AppResult;

/// Durable string key-value surface used to persist the offline queue.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads the value stored under a key.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Replaces the value stored under a key.
    async fn set(&self, key: &str, value: String) -> AppResult<()>;
}
