//! Health-polling connectivity signal.

use std::time::Duration;

use beacon_application::Connectivity;
use tokio::sync::watch;
use tracing::{debug, info};

/// Polls a health endpoint and publishes connectivity transitions.
///
/// Subscribers only observe actual transitions; repeated identical probe
/// results are not re-published.
pub struct HttpConnectivityProbe {
    http_client: reqwest::Client,
    health_url: String,
    poll_interval: Duration,
    sender: watch::Sender<Connectivity>,
}

impl HttpConnectivityProbe {
    /// Creates a probe that starts in the offline state.
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        health_url: impl Into<String>,
        poll_interval: Duration,
    ) -> Self {
        let (sender, _) = watch::channel(Connectivity::Offline);
        Self {
            http_client,
            health_url: health_url.into(),
            poll_interval: poll_interval.max(Duration::from_millis(100)),
            sender,
        }
    }

    /// Returns a receiver following the published connectivity.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Connectivity> {
        self.sender.subscribe()
    }

    /// Returns the last published connectivity.
    #[must_use]
    pub fn current(&self) -> Connectivity {
        *self.sender.borrow()
    }

    /// Probes the health endpoint once.
    pub async fn check_once(&self) -> Connectivity {
        let reachable = match self.http_client.get(self.health_url.as_str()).send().await {
            Ok(response) => response.status().is_success(),
            Err(error) => {
                debug!(health_url = %self.health_url, error = %error, "health probe failed");
                false
            }
        };

        Connectivity::from_reachable(reachable)
    }

    /// Publishes a probe result and reports whether it was a transition.
    pub fn publish(&self, connectivity: Connectivity) -> bool {
        let changed = self.sender.send_if_modified(|current| {
            if *current == connectivity {
                return false;
            }
            *current = connectivity;
            true
        });

        if changed {
            info!(
                health_url = %self.health_url,
                connectivity = connectivity.as_str(),
                "backend connectivity changed"
            );
        }

        changed
    }

    /// Polls forever at the configured interval.
    pub async fn run(&self) {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            let connectivity = self.check_once().await;
            self.publish(connectivity);
        }
    }
}
