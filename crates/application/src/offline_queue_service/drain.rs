use std::collections::HashSet;

use beacon_domain::RetryDisposition;
use tracing::{debug, info, warn};

use super::*;

enum FailedAttempt {
    Retained,
    Dropped(QueuedAction),
    Missing,
}

/// Clears the reentrancy flag when the drain pass ends, including when the
/// pass future is dropped mid-flight.
struct SyncingGuard<'a>(&'a AtomicBool);

impl Drop for SyncingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl OfflineActionQueue {
    /// Replays pending actions against the backing service.
    ///
    /// Skips when offline, when a pass is already in flight, or when nothing
    /// is queued. Actions are replayed one at a time in drain order from a
    /// snapshot. Actions enqueued during a pass are replayed by a follow-up
    /// pass before the call returns; each action is attempted at most once
    /// per call.
    pub async fn sync_queue(&self) -> SyncOutcome {
        if !self.is_online() {
            return SyncOutcome::Skipped {
                reason: SyncSkipReason::Offline,
            };
        }

        if !self.try_begin_drain() {
            self.resync_requested.store(true, Ordering::Release);
            debug!("offline queue drain already in flight, follow-up pass requested");
            return SyncOutcome::Skipped {
                reason: SyncSkipReason::AlreadySyncing,
            };
        }

        let mut report = SyncReport::default();
        let mut attempted = HashSet::new();
        let mut passes = 0_usize;

        loop {
            {
                let _guard = SyncingGuard(&self.syncing);
                let snapshot: Vec<QueuedAction> = self
                    .pending_actions()
                    .await
                    .into_iter()
                    .filter(|action| !attempted.contains(&action.id()))
                    .collect();

                if snapshot.is_empty() {
                    if passes == 0 {
                        return SyncOutcome::Skipped {
                            reason: SyncSkipReason::Empty,
                        };
                    }
                    break;
                }

                passes += 1;
                attempted.extend(snapshot.iter().map(QueuedAction::id));
                self.drain_pass(&snapshot, &mut report).await;
            }

            // Checked after the guard is released so a request raised while
            // the pass was finishing is not lost.
            if !self.is_online() || !self.resync_requested.swap(false, Ordering::AcqRel) {
                break;
            }
            if !self.try_begin_drain() {
                break;
            }
        }

        info!(
            passes,
            replayed = report.replayed,
            retried = report.retried,
            dropped = report.dropped,
            "offline action queue drain finished"
        );

        SyncOutcome::Completed { report }
    }

    fn try_begin_drain(&self) -> bool {
        self.syncing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    async fn drain_pass(&self, snapshot: &[QueuedAction], report: &mut SyncReport) {
        info!(pending = snapshot.len(), "draining offline action queue");

        let mut dropped_actions = Vec::new();

        for action in snapshot {
            match self.replayer.replay(action).await {
                Ok(()) => {
                    self.retire(action.id()).await;
                    report.replayed += 1;
                    debug!(action_id = %action.id(), "replayed offline action");
                }
                Err(error) => match self.record_failed_attempt(action.id()).await {
                    FailedAttempt::Retained => {
                        report.retried += 1;
                        warn!(
                            action_id = %action.id(),
                            action_type = %action.action_type(),
                            error = %error,
                            "offline action replay failed, keeping for retry"
                        );
                    }
                    FailedAttempt::Dropped(dropped) => {
                        report.dropped += 1;
                        warn!(
                            action_id = %dropped.id(),
                            action_type = %dropped.action_type(),
                            retry_count = dropped.retry_count(),
                            max_retries = dropped.max_retries(),
                            error = %error,
                            "offline action exceeded retries, dropping"
                        );
                        dropped_actions.push(dropped);
                    }
                    FailedAttempt::Missing => {
                        debug!(
                            action_id = %action.id(),
                            "offline action removed during replay"
                        );
                    }
                },
            }
        }

        {
            let actions = self.actions.lock().await;
            self.persist(actions.as_slice()).await;
        }

        if let Some(listener) = &self.dropped_action_listener {
            for action in &dropped_actions {
                listener.on_action_dropped(action).await;
            }
        }
    }

    async fn retire(&self, id: QueuedActionId) {
        self.actions.lock().await.retain(|action| action.id() != id);
    }

    async fn record_failed_attempt(&self, id: QueuedActionId) -> FailedAttempt {
        let mut actions = self.actions.lock().await;
        let Some(index) = actions.iter().position(|action| action.id() == id) else {
            return FailedAttempt::Missing;
        };

        match actions[index].record_failed_attempt() {
            RetryDisposition::Retry => FailedAttempt::Retained,
            RetryDisposition::Exhausted => FailedAttempt::Dropped(actions.remove(index)),
        }
    }
}
