use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use beacon_domain::{NewQueuedAction, QueuedAction, QueuedActionId};
use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::offline_queue_ports::{ActionReplayer, DroppedActionListener, KeyValueStore};

mod connectivity;
mod drain;
mod persistence;

/// Storage key used when the caller does not configure one.
pub const DEFAULT_QUEUE_STORAGE_KEY: &str = "beacon:offline_action_queue";

/// Offline queue settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfflineQueueConfig {
    /// Key under which the serialized queue is stored.
    pub storage_key: String,
}

impl Default for OfflineQueueConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_QUEUE_STORAGE_KEY.to_owned(),
        }
    }
}

/// Observable lifecycle state of the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueState {
    /// Online with nothing pending.
    Idle,
    /// Offline, or online with actions waiting for the next drain.
    Buffering,
    /// A drain pass is in flight.
    Draining,
}

impl QueueState {
    /// Returns a stable transport value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Buffering => "buffering",
            Self::Draining => "draining",
        }
    }
}

/// Why a sync request did not start a drain pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncSkipReason {
    /// The backing service is unreachable.
    Offline,
    /// Another drain pass is in flight.
    AlreadySyncing,
    /// Nothing is queued.
    Empty,
}

/// Counters for one completed drain pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Actions replayed successfully and retired.
    pub replayed: usize,
    /// Actions that failed and stay queued.
    pub retried: usize,
    /// Actions that failed past their retry ceiling and were dropped.
    pub dropped: usize,
}

/// Result of a sync request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// No drain pass ran.
    Skipped {
        /// Reason the pass was skipped.
        reason: SyncSkipReason,
    },
    /// A drain pass ran to completion.
    Completed {
        /// Pass counters.
        report: SyncReport,
    },
}

/// Buffers state-changing actions while offline and replays them in
/// priority order once connectivity returns.
///
/// Pending actions are kept in drain order: descending priority, FIFO within
/// one priority. Every mutation is written through to the key-value store.
pub struct OfflineActionQueue {
    store: Arc<dyn KeyValueStore>,
    replayer: Arc<dyn ActionReplayer>,
    dropped_action_listener: Option<Arc<dyn DroppedActionListener>>,
    config: OfflineQueueConfig,
    actions: Mutex<Vec<QueuedAction>>,
    online: AtomicBool,
    syncing: AtomicBool,
    resync_requested: AtomicBool,
}

impl OfflineActionQueue {
    /// Adds an observer notified for every action dropped after exhausting
    /// its retries.
    #[must_use]
    pub fn with_dropped_action_listener(
        mut self,
        dropped_action_listener: Arc<dyn DroppedActionListener>,
    ) -> Self {
        self.dropped_action_listener = Some(dropped_action_listener);
        self
    }

    /// Queues an action and returns its generated id.
    pub async fn enqueue(&self, input: NewQueuedAction) -> QueuedActionId {
        let action = QueuedAction::enqueued(input, Utc::now());
        let id = action.id();
        let priority = action.priority();

        let mut actions = self.actions.lock().await;
        let position = actions
            .iter()
            .position(|queued| queued.priority() < priority)
            .unwrap_or(actions.len());
        debug!(
            action_id = %id,
            action_type = %action.action_type(),
            priority,
            position,
            "queued offline action"
        );
        actions.insert(position, action);
        self.persist(actions.as_slice()).await;
        drop(actions);

        // An in-flight pass replays a snapshot; ask it for a follow-up pass.
        if self.syncing.load(Ordering::Acquire) {
            self.resync_requested.store(true, Ordering::Release);
        }

        id
    }

    /// Removes an action if it is still queued.
    pub async fn remove_from_queue(&self, id: QueuedActionId) {
        let mut actions = self.actions.lock().await;
        let before = actions.len();
        actions.retain(|action| action.id() != id);

        if actions.len() != before {
            info!(action_id = %id, "removed offline action");
            self.persist(actions.as_slice()).await;
        }
    }

    /// Returns the number of pending actions.
    pub async fn len(&self) -> usize {
        self.actions.lock().await.len()
    }

    /// Returns whether nothing is pending.
    pub async fn is_empty(&self) -> bool {
        self.actions.lock().await.is_empty()
    }

    /// Returns a snapshot of pending actions in drain order.
    pub async fn pending_actions(&self) -> Vec<QueuedAction> {
        self.actions.lock().await.clone()
    }

    /// Returns the last connectivity the queue was told about.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }

    /// Returns the current lifecycle state.
    pub async fn state(&self) -> QueueState {
        if self.syncing.load(Ordering::Acquire) {
            return QueueState::Draining;
        }

        if self.is_online() && self.is_empty().await {
            QueueState::Idle
        } else {
            QueueState::Buffering
        }
    }
}

#[cfg(test)]
mod tests;
