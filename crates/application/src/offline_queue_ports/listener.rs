use async_trait::async_trait;
use beacon_domain::QueuedAction;

/// Optional observer for actions abandoned after exhausting their retries.
#[async_trait]
pub trait DroppedActionListener: Send + Sync {
    /// Called once per permanently dropped action.
    async fn on_action_dropped(&self, action: &QueuedAction);
}
