use axum::Router;
use axum::routing::{delete, get, post};
use beacon_core::AppError;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

mod cors;

pub fn build_router(app_state: AppState, frontend_url: &str) -> Result<Router, AppError> {
    let access_routes = Router::new()
        .route(
            "/api/access/check",
            get(handlers::access::check_access_handler),
        )
        .route(
            "/api/access/resources",
            get(handlers::access::list_accessible_resources_handler),
        );

    let queue_routes = Router::new()
        .route(
            "/api/queue",
            get(handlers::queue::queue_status_handler)
                .post(handlers::queue::enqueue_action_handler),
        )
        .route("/api/queue/sync", post(handlers::queue::sync_queue_handler))
        .route(
            "/api/queue/{action_id}",
            delete(handlers::queue::remove_queued_action_handler),
        );

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(access_routes)
        .merge(queue_routes)
        .layer(cors::build_cors_layer(frontend_url)?)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state))
}
