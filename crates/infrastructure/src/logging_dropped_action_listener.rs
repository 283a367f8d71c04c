use async_trait::async_trait;
use beacon_application::DroppedActionListener;
use beacon_domain::QueuedAction;
use tracing::error;

/// Surfaces permanently dropped offline actions in the service log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingDroppedActionListener;

#[async_trait]
impl DroppedActionListener for LoggingDroppedActionListener {
    async fn on_action_dropped(&self, action: &QueuedAction) {
        error!(
            action_id = %action.id(),
            action_type = %action.action_type(),
            priority = action.priority(),
            retry_count = action.retry_count(),
            enqueued_at = %action.timestamp(),
            "offline action abandoned after exhausting retries"
        );
    }
}
