//! Beacon API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod dto;
mod error;
mod handlers;
mod state;

use std::sync::Arc;
use std::time::Duration;

use beacon_application::{KeyValueStore, OfflineActionQueue, OfflineQueueConfig};
use beacon_core::AppError;
use beacon_domain::RolePermissionTable;
use beacon_infrastructure::{
    HttpActionReplayer, HttpConnectivityProbe, InMemoryKeyValueStore,
    LoggingDroppedActionListener, RedisKeyValueStore,
};
use tracing::info;

use crate::api_config::{ApiConfig, QueueStoreConfig};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    api_config::init_tracing();

    let config = ApiConfig::load()?;

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_millis(config.replay_timeout_ms))
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;

    let store: Arc<dyn KeyValueStore> = match &config.queue_store {
        QueueStoreConfig::Memory => Arc::new(InMemoryKeyValueStore::new()),
        QueueStoreConfig::Redis { url } => {
            let client = redis::Client::open(url.as_str())
                .map_err(|error| AppError::Validation(format!("invalid REDIS_URL: {error}")))?;
            Arc::new(RedisKeyValueStore::new(client, "beacon"))
        }
    };

    let replayer = Arc::new(HttpActionReplayer::new(
        http_client.clone(),
        config.replay_endpoint_url.clone(),
    ));
    let offline_queue = Arc::new(
        OfflineActionQueue::load(
            store,
            replayer,
            OfflineQueueConfig {
                storage_key: config.queue_storage_key.clone(),
            },
        )
        .await
        .with_dropped_action_listener(Arc::new(LoggingDroppedActionListener)),
    );

    let probe = Arc::new(HttpConnectivityProbe::new(
        http_client,
        config.connectivity_health_url.clone(),
        Duration::from_millis(config.connectivity_poll_interval_ms),
    ));
    let connectivity = probe.subscribe();
    tokio::spawn({
        let probe = probe.clone();
        async move { probe.run().await }
    });
    tokio::spawn({
        let offline_queue = offline_queue.clone();
        async move { offline_queue.watch_connectivity(connectivity).await }
    });

    let app_state = AppState {
        permission_table: Arc::new(RolePermissionTable::standard()),
        offline_queue,
        default_max_retries: config.default_max_retries,
    };

    let app = api_router::build_router(app_state, config.frontend_url.as_str())?;

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind API listener: {error}")))?;

    info!(%address, "beacon api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server failed: {error}")))
}
