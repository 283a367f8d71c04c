use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use beacon_core::{AppError, AppResult};
use beacon_domain::{NewQueuedAction, QueuedAction, QueuedActionId, QueuedActionType};
use serde_json::json;
use tokio::sync::{Mutex, watch};

use crate::offline_queue_ports::{
    ActionReplayer, Connectivity, DroppedActionListener, KeyValueStore,
};

use super::{
    OfflineActionQueue, OfflineQueueConfig, QueueState, SyncOutcome, SyncReport, SyncSkipReason,
};

#[derive(Default)]
struct FakeKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
    fail_reads: bool,
    fail_writes: bool,
    writes: AtomicUsize,
}

impl FakeKeyValueStore {
    fn with_raw(key: &str, raw: &str) -> Self {
        Self {
            entries: Mutex::new(HashMap::from([(key.to_owned(), raw.to_owned())])),
            ..Self::default()
        }
    }

    async fn raw(&self, key: &str) -> Option<String> {
        self.entries.lock().await.get(key).cloned()
    }
}

#[async_trait]
impl KeyValueStore for FakeKeyValueStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        if self.fail_reads {
            return Err(AppError::Unavailable("store offline".to_owned()));
        }
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> AppResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes {
            return Err(AppError::Unavailable("store read-only".to_owned()));
        }
        self.entries.lock().await.insert(key.to_owned(), value);
        Ok(())
    }
}

#[derive(Default)]
struct FakeActionReplayer {
    calls: Mutex<Vec<(QueuedActionId, i32)>>,
    failing_ids: Mutex<HashSet<QueuedActionId>>,
    fail_all: bool,
    yield_before_reply: bool,
}

impl FakeActionReplayer {
    fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::default()
        }
    }

    fn yielding() -> Self {
        Self {
            yield_before_reply: true,
            ..Self::default()
        }
    }

    async fn replayed_priorities(&self) -> Vec<i32> {
        self.calls
            .lock()
            .await
            .iter()
            .map(|(_, priority)| *priority)
            .collect()
    }

    async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }
}

#[async_trait]
impl ActionReplayer for FakeActionReplayer {
    async fn replay(&self, action: &QueuedAction) -> AppResult<()> {
        if self.yield_before_reply {
            tokio::task::yield_now().await;
        }

        self.calls
            .lock()
            .await
            .push((action.id(), action.priority()));

        if self.fail_all || self.failing_ids.lock().await.contains(&action.id()) {
            return Err(AppError::Unavailable("backend unreachable".to_owned()));
        }
        Ok(())
    }
}

#[derive(Default)]
struct RecordingListener {
    dropped: Mutex<Vec<QueuedActionId>>,
}

#[async_trait]
impl DroppedActionListener for RecordingListener {
    async fn on_action_dropped(&self, action: &QueuedAction) {
        self.dropped.lock().await.push(action.id());
    }
}

fn storage_key() -> String {
    OfflineQueueConfig::default().storage_key
}

fn message(priority: i32) -> NewQueuedAction {
    NewQueuedAction::new(
        QueuedActionType::SendMessage,
        json!({ "body": format!("priority {priority}") }),
    )
    .with_priority(priority)
}

async fn queue_with(
    store: Arc<FakeKeyValueStore>,
    replayer: Arc<FakeActionReplayer>,
) -> OfflineActionQueue {
    OfflineActionQueue::load(store, replayer, OfflineQueueConfig::default()).await
}

fn completed(outcome: SyncOutcome) -> SyncReport {
    match outcome {
        SyncOutcome::Completed { report } => report,
        SyncOutcome::Skipped { reason } => panic!("expected a drain pass, skipped: {reason:?}"),
    }
}

#[tokio::test]
async fn drain_replays_in_descending_priority_order() {
    let store = Arc::new(FakeKeyValueStore::default());
    let replayer = Arc::new(FakeActionReplayer::default());
    let queue = queue_with(store, replayer.clone()).await;

    queue.enqueue(message(1)).await;
    queue.enqueue(message(5)).await;
    queue.enqueue(message(3)).await;
    queue.set_connectivity(Connectivity::Online).await;

    assert_eq!(replayer.replayed_priorities().await, vec![5, 3, 1]);
    assert!(queue.is_empty().await);
    assert_eq!(queue.state().await, QueueState::Idle);
}

#[tokio::test]
async fn equal_priorities_drain_in_insertion_order() {
    let store = Arc::new(FakeKeyValueStore::default());
    let replayer = Arc::new(FakeActionReplayer::default());
    let queue = queue_with(store, replayer.clone()).await;

    let first = queue.enqueue(message(2)).await;
    let urgent = queue.enqueue(message(9)).await;
    let second = queue.enqueue(message(2)).await;

    let order: Vec<QueuedActionId> = queue
        .pending_actions()
        .await
        .iter()
        .map(QueuedAction::id)
        .collect();
    assert_eq!(order, vec![urgent, first, second]);
}

#[tokio::test]
async fn always_failing_action_is_attempted_max_retries_times() {
    let store = Arc::new(FakeKeyValueStore::default());
    let replayer = Arc::new(FakeActionReplayer::failing());
    let listener = Arc::new(RecordingListener::default());
    let queue = queue_with(store, replayer.clone())
        .await
        .with_dropped_action_listener(listener.clone());

    let input = message(1).with_max_retries(3);
    let Ok(input) = input else {
        panic!("valid input rejected");
    };
    let id = queue.enqueue(input).await;
    queue.set_connectivity(Connectivity::Online).await;

    let first = queue.pending_actions().await;
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].retry_count(), 1);

    let second = completed(queue.sync_queue().await);
    assert_eq!(second.retried, 1);
    assert_eq!(queue.len().await, 1);

    let third = completed(queue.sync_queue().await);
    assert_eq!(third.dropped, 1);
    assert!(queue.is_empty().await);
    assert_eq!(replayer.call_count().await, 3);
    assert_eq!(*listener.dropped.lock().await, vec![id]);

    assert_eq!(
        queue.sync_queue().await,
        SyncOutcome::Skipped {
            reason: SyncSkipReason::Empty
        }
    );
    assert_eq!(replayer.call_count().await, 3);
}

#[tokio::test]
async fn failed_and_successful_actions_are_split_after_pass() {
    let store = Arc::new(FakeKeyValueStore::default());
    let replayer = Arc::new(FakeActionReplayer::default());
    let queue = queue_with(store.clone(), replayer.clone()).await;

    let kept = queue.enqueue(message(4)).await;
    queue.enqueue(message(2)).await;
    replayer.failing_ids.lock().await.insert(kept);

    queue.set_connectivity(Connectivity::Online).await;
    let pending = queue.pending_actions().await;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id(), kept);

    let persisted = store.raw(storage_key().as_str()).await.unwrap_or_default();
    assert!(persisted.contains(kept.to_string().as_str()));
}

#[tokio::test]
async fn persisted_queue_round_trips_into_fresh_instance() {
    let store = Arc::new(FakeKeyValueStore::default());
    let queue = queue_with(store.clone(), Arc::new(FakeActionReplayer::default())).await;

    queue.enqueue(message(1)).await;
    queue
        .enqueue(
            NewQueuedAction::new(
                QueuedActionType::UploadEvidence,
                json!({ "incident_id": "inc-7", "file": "photo.jpg" }),
            )
            .with_priority(8),
        )
        .await;
    queue.enqueue(message(3)).await;
    let original = queue.pending_actions().await;

    let restored = queue_with(store, Arc::new(FakeActionReplayer::default())).await;
    let restored = restored.pending_actions().await;

    assert_eq!(restored.len(), original.len());
    for (left, right) in original.iter().zip(restored.iter()) {
        assert_eq!(left.id(), right.id());
        assert_eq!(left.action_type(), right.action_type());
        assert_eq!(left.payload(), right.payload());
        assert_eq!(left.priority(), right.priority());
    }
}

#[tokio::test]
async fn corrupt_persisted_state_initializes_empty() {
    let store = Arc::new(FakeKeyValueStore::with_raw(
        storage_key().as_str(),
        "{not json",
    ));
    let queue = queue_with(store, Arc::new(FakeActionReplayer::default())).await;

    assert!(queue.is_empty().await);
    assert_eq!(queue.state().await, QueueState::Buffering);
}

#[tokio::test]
async fn unreadable_store_initializes_empty() {
    let store = Arc::new(FakeKeyValueStore {
        fail_reads: true,
        ..FakeKeyValueStore::default()
    });
    let queue = queue_with(store, Arc::new(FakeActionReplayer::default())).await;
    assert!(queue.is_empty().await);
}

#[tokio::test]
async fn rehydrated_actions_are_restored_in_drain_order() {
    let store = Arc::new(FakeKeyValueStore::default());
    let queue = queue_with(store.clone(), Arc::new(FakeActionReplayer::default())).await;
    queue.enqueue(message(1)).await;
    queue.enqueue(message(7)).await;

    let raw = store.raw(storage_key().as_str()).await.unwrap_or_default();
    let mut persisted: Vec<serde_json::Value> = serde_json::from_str(raw.as_str()).unwrap_or_default();
    persisted.reverse();
    let reversed = serde_json::to_string(&persisted).unwrap_or_default();

    let store = Arc::new(FakeKeyValueStore::with_raw(
        storage_key().as_str(),
        reversed.as_str(),
    ));
    let restored = queue_with(store, Arc::new(FakeActionReplayer::default())).await;
    let priorities: Vec<i32> = restored
        .pending_actions()
        .await
        .iter()
        .map(QueuedAction::priority)
        .collect();
    assert_eq!(priorities, vec![7, 1]);
}

#[tokio::test]
async fn rehydrated_equal_priorities_are_ordered_by_timestamp() {
    let store = Arc::new(FakeKeyValueStore::default());
    let queue = queue_with(store.clone(), Arc::new(FakeActionReplayer::default())).await;
    let first = queue.enqueue(message(4)).await;
    let second = queue.enqueue(message(4)).await;

    let raw = store.raw(storage_key().as_str()).await.unwrap_or_default();
    let mut persisted: Vec<serde_json::Value> = serde_json::from_str(raw.as_str()).unwrap_or_default();
    assert_eq!(persisted.len(), 2);
    persisted[0]["timestamp"] = json!(1_700_000_002_000_i64);
    persisted[1]["timestamp"] = json!(1_700_000_001_000_i64);
    let rewritten = serde_json::to_string(&persisted).unwrap_or_default();

    let store = Arc::new(FakeKeyValueStore::with_raw(
        storage_key().as_str(),
        rewritten.as_str(),
    ));
    let restored = queue_with(store, Arc::new(FakeActionReplayer::default())).await;
    let order: Vec<QueuedActionId> = restored
        .pending_actions()
        .await
        .iter()
        .map(QueuedAction::id)
        .collect();
    assert_eq!(order, vec![second, first]);
}

#[tokio::test]
async fn concurrent_sync_requests_run_one_pass() {
    let store = Arc::new(FakeKeyValueStore::default());
    let replayer = Arc::new(FakeActionReplayer::yielding());
    let queue = queue_with(store, replayer.clone()).await;

    queue.enqueue(message(1)).await;
    queue.set_connectivity(Connectivity::Online).await;
    assert_eq!(replayer.call_count().await, 1);

    queue.enqueue(message(2)).await;
    let (first, second, observed) = tokio::join!(
        queue.sync_queue(),
        queue.sync_queue(),
        queue.state()
    );

    assert_eq!(completed(first).replayed, 1);
    assert_eq!(
        second,
        SyncOutcome::Skipped {
            reason: SyncSkipReason::AlreadySyncing
        }
    );
    assert_eq!(observed, QueueState::Draining);
    assert_eq!(replayer.call_count().await, 2);
}

#[tokio::test]
async fn actions_enqueued_mid_drain_are_replayed_by_follow_up_pass() {
    let store = Arc::new(FakeKeyValueStore::default());
    let replayer = Arc::new(FakeActionReplayer::yielding());
    let queue = queue_with(store, replayer.clone()).await;
    queue.set_connectivity(Connectivity::Online).await;

    queue.enqueue(message(1)).await;
    let (outcome, _late) = tokio::join!(queue.sync_queue(), queue.enqueue(message(10)));

    // The late action was not in the first snapshot, so it drains second
    // despite its higher priority.
    assert_eq!(completed(outcome).replayed, 2);
    assert_eq!(replayer.replayed_priorities().await, vec![1, 10]);
    assert!(queue.is_empty().await);
    assert_eq!(queue.state().await, QueueState::Idle);
}

#[tokio::test]
async fn sync_request_rejected_mid_drain_is_served_by_running_drain() {
    let store = Arc::new(FakeKeyValueStore::default());
    let replayer = Arc::new(FakeActionReplayer::yielding());
    let queue = queue_with(store, replayer.clone()).await;
    queue.set_connectivity(Connectivity::Online).await;

    queue.enqueue(message(1)).await;
    let (outcome, (late, rejected)) = tokio::join!(queue.sync_queue(), async {
        let late = queue.enqueue(message(3)).await;
        (late, queue.sync_queue().await)
    });

    assert_eq!(
        rejected,
        SyncOutcome::Skipped {
            reason: SyncSkipReason::AlreadySyncing
        }
    );
    assert_eq!(completed(outcome).replayed, 2);
    assert!(queue.is_empty().await);

    let replayed: Vec<QueuedActionId> = replayer
        .calls
        .lock()
        .await
        .iter()
        .map(|(id, _)| *id)
        .collect();
    assert_eq!(replayed.last(), Some(&late));
}

#[tokio::test]
async fn follow_up_pass_does_not_retry_failed_actions_again() {
    let store = Arc::new(FakeKeyValueStore::default());
    let replayer = Arc::new(FakeActionReplayer {
        fail_all: true,
        yield_before_reply: true,
        ..FakeActionReplayer::default()
    });
    let queue = queue_with(store, replayer.clone()).await;
    queue.set_connectivity(Connectivity::Online).await;

    queue.enqueue(message(1)).await;
    let (outcome, _late) = tokio::join!(queue.sync_queue(), queue.enqueue(message(2)));

    assert_eq!(completed(outcome).retried, 2);
    assert_eq!(replayer.call_count().await, 2);
    let retry_counts: Vec<u32> = queue
        .pending_actions()
        .await
        .iter()
        .map(QueuedAction::retry_count)
        .collect();
    assert_eq!(retry_counts, vec![1, 1]);
}

#[tokio::test]
async fn action_removed_mid_drain_stays_removed() {
    let store = Arc::new(FakeKeyValueStore::default());
    let replayer = Arc::new(FakeActionReplayer {
        fail_all: true,
        yield_before_reply: true,
        ..FakeActionReplayer::default()
    });
    let listener = Arc::new(RecordingListener::default());
    let queue = queue_with(store.clone(), replayer.clone())
        .await
        .with_dropped_action_listener(listener.clone());
    queue.set_connectivity(Connectivity::Online).await;

    let Ok(input) = message(1).with_max_retries(1) else {
        panic!("valid input rejected");
    };
    let id = queue.enqueue(input).await;

    let (outcome, ()) = tokio::join!(queue.sync_queue(), queue.remove_from_queue(id));

    assert_eq!(completed(outcome), SyncReport::default());
    assert_eq!(replayer.call_count().await, 1);
    assert!(queue.is_empty().await);
    assert!(listener.dropped.lock().await.is_empty());

    let persisted = store.raw(storage_key().as_str()).await.unwrap_or_default();
    assert!(!persisted.contains(id.to_string().as_str()));
}

#[tokio::test]
async fn sync_while_offline_is_a_no_op() {
    let store = Arc::new(FakeKeyValueStore::default());
    let replayer = Arc::new(FakeActionReplayer::default());
    let queue = queue_with(store, replayer.clone()).await;
    queue.enqueue(message(1)).await;

    assert_eq!(
        queue.sync_queue().await,
        SyncOutcome::Skipped {
            reason: SyncSkipReason::Offline
        }
    );
    assert_eq!(replayer.call_count().await, 0);
    assert_eq!(queue.state().await, QueueState::Buffering);
}

#[tokio::test]
async fn duplicate_online_signal_does_not_drain_again() {
    let store = Arc::new(FakeKeyValueStore::default());
    let replayer = Arc::new(FakeActionReplayer::failing());
    let queue = queue_with(store, replayer.clone()).await;
    queue.enqueue(message(1)).await;

    assert!(queue.set_connectivity(Connectivity::Online).await.is_some());
    assert!(queue.set_connectivity(Connectivity::Online).await.is_none());
    assert_eq!(replayer.call_count().await, 1);

    assert!(queue.set_connectivity(Connectivity::Offline).await.is_none());
    assert!(!queue.is_online());
    assert!(queue.set_connectivity(Connectivity::Online).await.is_some());
    assert_eq!(replayer.call_count().await, 2);
}

#[tokio::test]
async fn remove_from_queue_is_idempotent() {
    let store = Arc::new(FakeKeyValueStore::default());
    let queue = queue_with(store.clone(), Arc::new(FakeActionReplayer::default())).await;

    let id = queue.enqueue(message(1)).await;
    let writes_after_enqueue = store.writes.load(Ordering::SeqCst);

    queue.remove_from_queue(id).await;
    queue.remove_from_queue(id).await;
    queue.remove_from_queue(QueuedActionId::new()).await;

    assert!(queue.is_empty().await);
    assert_eq!(store.writes.load(Ordering::SeqCst), writes_after_enqueue + 1);
}

#[tokio::test]
async fn enqueue_survives_storage_write_failures() {
    let store = Arc::new(FakeKeyValueStore {
        fail_writes: true,
        ..FakeKeyValueStore::default()
    });
    let queue = queue_with(store.clone(), Arc::new(FakeActionReplayer::default())).await;

    let id = queue.enqueue(message(1)).await;
    let pending = queue.pending_actions().await;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id(), id);
    assert_eq!(pending[0].retry_count(), 0);
    assert_eq!(store.writes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn watcher_drains_when_signal_turns_online() {
    let store = Arc::new(FakeKeyValueStore::default());
    let replayer = Arc::new(FakeActionReplayer::default());
    let queue = Arc::new(queue_with(store, replayer.clone()).await);
    queue.enqueue(message(1)).await;

    let (sender, receiver) = watch::channel(Connectivity::Offline);
    let watcher = tokio::spawn({
        let queue = queue.clone();
        async move { queue.watch_connectivity(receiver).await }
    });

    let _ = sender.send(Connectivity::Online);
    drop(sender);
    let joined = watcher.await;
    assert!(joined.is_ok());

    assert!(queue.is_online());
    assert!(queue.is_empty().await);
    assert_eq!(replayer.call_count().await, 1);
}
