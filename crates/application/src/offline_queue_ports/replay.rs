use async_trait::async_trait;
use beacon_core::AppResult;
use beacon_domain::QueuedAction;

/// Port for replaying one queued action against the backing service.
#[async_trait]
pub trait ActionReplayer: Send + Sync {
    /// Replays one action. Any error counts as a failed attempt.
    async fn replay(&self, action: &QueuedAction) -> AppResult<()>;
}
