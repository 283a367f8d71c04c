use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use beacon_application::SyncOutcome;
use beacon_domain::{NewQueuedAction, QueuedActionId, QueuedActionType};
use tracing::debug;

use crate::dto::{
    EnqueueActionRequest, EnqueueActionResponse, QueueStatusResponse, QueuedActionResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn enqueue_action_handler(
    State(state): State<AppState>,
    Json(payload): Json<EnqueueActionRequest>,
) -> ApiResult<(StatusCode, Json<EnqueueActionResponse>)> {
    let action_type = payload.action_type.parse::<QueuedActionType>()?;
    let input = NewQueuedAction::new(action_type, payload.payload)
        .with_priority(payload.priority.unwrap_or(0))
        .with_max_retries(payload.max_retries.unwrap_or(state.default_max_retries))?;

    let id = state.offline_queue.enqueue(input).await;

    if state.offline_queue.is_online() {
        let queue = state.offline_queue.clone();
        tokio::spawn(async move {
            let outcome = queue.sync_queue().await;
            debug!(?outcome, "drain triggered by online enqueue");
        });
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(EnqueueActionResponse { id: id.to_string() }),
    ))
}

pub async fn remove_queued_action_handler(
    State(state): State<AppState>,
    Path(action_id): Path<String>,
) -> ApiResult<StatusCode> {
    let action_id = action_id.parse::<QueuedActionId>()?;
    state.offline_queue.remove_from_queue(action_id).await;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn sync_queue_handler(State(state): State<AppState>) -> Json<SyncOutcome> {
    Json(state.offline_queue.sync_queue().await)
}

pub async fn queue_status_handler(State(state): State<AppState>) -> Json<QueueStatusResponse> {
    let queue = &state.offline_queue;
    let actions: Vec<QueuedActionResponse> = queue
        .pending_actions()
        .await
        .into_iter()
        .map(QueuedActionResponse::from)
        .collect();

    Json(QueueStatusResponse {
        state: queue.state().await,
        online: queue.is_online(),
        length: actions.len(),
        actions,
    })
}
