use async_trait::async_trait;
use beacon_application::ActionReplayer;
use beacon_core::{AppError, AppResult};
use beacon_domain::QueuedAction;
use serde_json::{Value, json};
use tracing::debug;

/// HTTP implementation of the replay endpoint port.
///
/// Issues a single POST per replay. Retrying is left to the offline queue's
/// retry count, so transient statuses are reported as errors immediately.
pub struct HttpActionReplayer {
    http_client: reqwest::Client,
    endpoint_url: String,
}

impl HttpActionReplayer {
    /// Creates a replayer posting to the given endpoint.
    ///
    /// Per-request timeouts come from the configured client.
    #[must_use]
    pub fn new(http_client: reqwest::Client, endpoint_url: impl Into<String>) -> Self {
        Self {
            http_client,
            endpoint_url: endpoint_url.into(),
        }
    }
}

fn replay_request_body(action: &QueuedAction) -> Value {
    json!({
        "id": action.id(),
        "type": action.action_type().as_str(),
        "payload": action.payload(),
        "timestamp": action.timestamp().timestamp_millis(),
        "priority": action.priority(),
        "retryCount": action.retry_count(),
    })
}

#[async_trait]
impl ActionReplayer for HttpActionReplayer {
    async fn replay(&self, action: &QueuedAction) -> AppResult<()> {
        let action_id = action.id().to_string();
        let response = self
            .http_client
            .post(self.endpoint_url.as_str())
            .header("Idempotency-Key", action_id.as_str())
            .header("X-Beacon-Action-Type", action.action_type().as_str())
            .json(&replay_request_body(action))
            .send()
            .await
            .map_err(|error| {
                AppError::Unavailable(format!(
                    "offline action replay transport error for '{action_id}': {error}"
                ))
            })?;

        let status = response.status();
        match classify_replay_status(status, action_id.as_str()) {
            Ok(()) => {
                debug!(action_id = %action_id, status = status.as_u16(), "replay accepted");
                Ok(())
            }
            Err(AppError::Validation(message)) => {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "<response body unavailable>".to_owned());
                Err(AppError::Validation(format!("{message}: {body}")))
            }
            Err(error) => Err(error),
        }
    }
}

/// Maps a replay response status onto the queue's retry semantics.
///
/// Server errors and rate limiting are transient. Any other non-success
/// status means the backend rejected the action itself.
fn classify_replay_status(status: reqwest::StatusCode, action_id: &str) -> AppResult<()> {
    if status.is_success() {
        return Ok(());
    }

    if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(AppError::Unavailable(format!(
            "transient HTTP status {status} replaying offline action '{action_id}'"
        )));
    }

    Err(AppError::Validation(format!(
        "offline action replay rejected with status {status}"
    )))
}
