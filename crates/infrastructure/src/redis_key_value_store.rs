//! Redis-backed key-value store for offline queue persistence.

use std::time::Duration;

use async_trait::async_trait;
use beacon_application::KeyValueStore;
use beacon_core::{AppError, AppResult};
use redis::AsyncCommands;

/// Connect timeout used unless the caller configures one.
pub const DEFAULT_REDIS_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Redis implementation of the key-value store port.
#[derive(Clone)]
pub struct RedisKeyValueStore {
    client: redis::Client,
    key_prefix: String,
    connect_timeout: Duration,
}

impl RedisKeyValueStore {
    /// Creates a store adapter with a configured Redis client and key prefix.
    #[must_use]
    pub fn new(client: redis::Client, key_prefix: impl Into<String>) -> Self {
        Self {
            client,
            key_prefix: key_prefix.into(),
            connect_timeout: DEFAULT_REDIS_CONNECT_TIMEOUT,
        }
    }

    /// Bounds how long one operation may wait for a connection.
    #[must_use]
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    fn key_for(&self, key: &str) -> String {
        if self.key_prefix.is_empty() {
            key.to_owned()
        } else {
            format!("{}:{key}", self.key_prefix)
        }
    }

    async fn connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        tokio::time::timeout(
            self.connect_timeout,
            self.client.get_multiplexed_async_connection(),
        )
        .await
        .map_err(|_| {
            AppError::Unavailable(format!(
                "timed out connecting to redis after {} ms",
                self.connect_timeout.as_millis()
            ))
        })?
        .map_err(|error| AppError::Unavailable(format!("failed to connect to redis: {error}")))
    }
}

#[async_trait]
impl KeyValueStore for RedisKeyValueStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut connection = self.connection().await?;

        connection.get(self.key_for(key)).await.map_err(|error| {
            AppError::Internal(format!("failed to read key-value entry '{key}': {error}"))
        })
    }

    async fn set(&self, key: &str, value: String) -> AppResult<()> {
        let mut connection = self.connection().await?;

        connection
            .set::<_, _, ()>(self.key_for(key), value)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to write key-value entry '{key}': {error}"))
            })
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use beacon_application::KeyValueStore;
    use beacon_core::AppError;

    use super::RedisKeyValueStore;

    fn client() -> redis::Client {
        client_for("redis://127.0.0.1:6379")
    }

    fn client_for(url: &str) -> redis::Client {
        match redis::Client::open(url) {
            Ok(client) => client,
            Err(error) => panic!("redis url should parse: {error}"),
        }
    }

    #[test]
    fn keys_are_namespaced_by_prefix() {
        let store = RedisKeyValueStore::new(client(), "beacon");
        assert_eq!(store.key_for("offline_queue"), "beacon:offline_queue");
    }

    #[test]
    fn empty_prefix_keeps_key_as_is() {
        let store = RedisKeyValueStore::new(client(), "");
        assert_eq!(store.key_for("offline_queue"), "offline_queue");
    }

    #[tokio::test]
    async fn unreachable_server_fails_within_connect_timeout() {
        // Non-routable address: the connect attempt either hangs or is refused.
        let store = RedisKeyValueStore::new(client_for("redis://10.255.255.1:6379"), "beacon")
            .with_connect_timeout(Duration::from_millis(100));

        let started = Instant::now();
        let result = store.set("offline_queue", "[]".to_owned()).await;

        assert!(matches!(result, Err(AppError::Unavailable(_))));
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
