use tokio::sync::watch;
use tracing::{debug, info};

use crate::offline_queue_ports::Connectivity;

use super::*;

impl OfflineActionQueue {
    /// Applies one connectivity signal.
    ///
    /// Repeated signals with the same value are ignored. A transition to
    /// online with pending actions runs a drain and returns its outcome.
    pub async fn set_connectivity(&self, connectivity: Connectivity) -> Option<SyncOutcome> {
        let online = connectivity.is_online();
        let was_online = self.online.swap(online, Ordering::AcqRel);
        if was_online == online {
            return None;
        }

        let pending = self.len().await;
        info!(
            connectivity = connectivity.as_str(),
            pending, "offline queue connectivity changed"
        );

        if !online || pending == 0 {
            return None;
        }

        Some(self.sync_queue().await)
    }

    /// Follows a connectivity channel until its sender is dropped.
    pub async fn watch_connectivity(&self, mut receiver: watch::Receiver<Connectivity>) {
        loop {
            let connectivity = *receiver.borrow_and_update();
            if let Some(outcome) = self.set_connectivity(connectivity).await {
                debug!(?outcome, "drain triggered by connectivity restore");
            }

            if receiver.changed().await.is_err() {
                debug!("connectivity signal closed, stopping watcher");
                return;
            }
        }
    }
}
