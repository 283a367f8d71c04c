use beacon_core::{AppError, AppResult};
use tracing::{info, warn};

use super::*;

impl OfflineActionQueue {
    /// Creates a queue rehydrated from the key-value store.
    ///
    /// Missing, unreadable, or corrupt persisted state yields an empty queue.
    /// The queue starts offline until a connectivity signal arrives.
    pub async fn load(
        store: Arc<dyn KeyValueStore>,
        replayer: Arc<dyn ActionReplayer>,
        config: OfflineQueueConfig,
    ) -> Self {
        let actions = match store.get(config.storage_key.as_str()).await {
            Ok(Some(raw)) => decode_actions(raw.as_str()).unwrap_or_else(|error| {
                warn!(
                    storage_key = %config.storage_key,
                    error = %error,
                    "discarding corrupt offline queue state"
                );
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(error) => {
                warn!(
                    storage_key = %config.storage_key,
                    error = %error,
                    "failed to read offline queue state"
                );
                Vec::new()
            }
        };

        info!(
            storage_key = %config.storage_key,
            pending = actions.len(),
            "offline action queue loaded"
        );

        Self {
            store,
            replayer,
            dropped_action_listener: None,
            config,
            actions: Mutex::new(actions),
            online: AtomicBool::new(false),
            syncing: AtomicBool::new(false),
            resync_requested: AtomicBool::new(false),
        }
    }

    /// Writes the queue through to the store. Failures are logged, not raised.
    pub(super) async fn persist(&self, actions: &[QueuedAction]) {
        let encoded = match encode_actions(actions) {
            Ok(encoded) => encoded,
            Err(error) => {
                warn!(error = %error, "failed to encode offline queue state");
                return;
            }
        };

        if let Err(error) = self
            .store
            .set(self.config.storage_key.as_str(), encoded)
            .await
        {
            warn!(
                storage_key = %self.config.storage_key,
                pending = actions.len(),
                error = %error,
                "failed to persist offline queue state"
            );
        }
    }
}

pub(super) fn encode_actions(actions: &[QueuedAction]) -> AppResult<String> {
    serde_json::to_string(actions).map_err(|error| {
        AppError::Internal(format!("failed to encode offline queue state: {error}"))
    })
}

pub(super) fn decode_actions(raw: &str) -> AppResult<Vec<QueuedAction>> {
    let mut actions: Vec<QueuedAction> = serde_json::from_str(raw).map_err(|error| {
        AppError::Internal(format!("failed to decode offline queue state: {error}"))
    })?;

    // Stable, so persisted order breaks ties between equal timestamps.
    actions.sort_by(|left, right| {
        right
            .priority()
            .cmp(&left.priority())
            .then(left.timestamp().cmp(&right.timestamp()))
    });
    Ok(actions)
}
