use beacon_application::QueueState;
use beacon_domain::QueuedAction;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// API error payload.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    message: String,
}

impl ErrorResponse {
    pub fn new(message: String) -> Self {
        Self { message }
    }
}

/// Health response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Query for one authorization decision.
#[derive(Debug, Deserialize)]
pub struct AccessCheckQuery {
    pub role: String,
    pub user_id: String,
    pub resource: String,
    pub action: String,
    pub record_owner_id: Option<String>,
}

/// Authorization decision payload.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct AccessCheckResponse {
    pub allowed: bool,
}

/// Query identifying the acting user.
#[derive(Debug, Deserialize)]
pub struct ActorQuery {
    pub role: String,
    pub user_id: String,
}

/// Resources visible to one actor.
#[derive(Debug, Serialize)]
pub struct AccessibleResourcesResponse {
    pub role: Option<&'static str>,
    pub resources: Vec<String>,
}

/// Incoming payload for queuing an offline action.
#[derive(Debug, Deserialize)]
pub struct EnqueueActionRequest {
    #[serde(rename = "type")]
    pub action_type: String,
    #[serde(default)]
    pub payload: Value,
    pub priority: Option<i32>,
    pub max_retries: Option<u32>,
}

/// Identifier of a queued action.
#[derive(Debug, Serialize)]
pub struct EnqueueActionResponse {
    pub id: String,
}

/// API representation of a queued action.
#[derive(Debug, Serialize)]
pub struct QueuedActionResponse {
    pub id: String,
    #[serde(rename = "type")]
    pub action_type: String,
    pub payload: Value,
    pub enqueued_at: String,
    pub priority: i32,
    pub retry_count: u32,
    pub max_retries: u32,
}

impl From<QueuedAction> for QueuedActionResponse {
    fn from(value: QueuedAction) -> Self {
        Self {
            id: value.id().to_string(),
            action_type: value.action_type().as_str().to_owned(),
            payload: value.payload().clone(),
            enqueued_at: value.timestamp().to_rfc3339(),
            priority: value.priority(),
            retry_count: value.retry_count(),
            max_retries: value.max_retries(),
        }
    }
}

/// Offline queue observation payload.
#[derive(Debug, Serialize)]
pub struct QueueStatusResponse {
    pub state: QueueState,
    pub online: bool,
    pub length: usize,
    pub actions: Vec<QueuedActionResponse>,
}
