use axum::Json;
use axum::extract::{Query, State};
use beacon_application::AccessControl;
use beacon_core::ActorIdentity;
use beacon_domain::{AccessContext, Action};

use crate::dto::{AccessCheckQuery, AccessCheckResponse, AccessibleResourcesResponse, ActorQuery};
use crate::state::AppState;

pub async fn check_access_handler(
    State(state): State<AppState>,
    Query(query): Query<AccessCheckQuery>,
) -> Json<AccessCheckResponse> {
    let actor = ActorIdentity::new(query.user_id, query.role);
    let access = AccessControl::for_actor(state.permission_table.clone(), &actor);

    // Unknown actions are a denial, not a client error.
    let allowed = query.action.parse::<Action>().is_ok_and(|action| {
        let context = query.record_owner_id.map(AccessContext::for_record_owner);
        access.has_permission(query.resource.as_str(), action, context.as_ref())
    });

    Json(AccessCheckResponse { allowed })
}

pub async fn list_accessible_resources_handler(
    State(state): State<AppState>,
    Query(query): Query<ActorQuery>,
) -> Json<AccessibleResourcesResponse> {
    let actor = ActorIdentity::new(query.user_id, query.role);
    let access = AccessControl::for_actor(state.permission_table.clone(), &actor);

    Json(AccessibleResourcesResponse {
        role: access.role().map(|role| role.as_str()),
        resources: access
            .accessible_resources()
            .into_iter()
            .map(str::to_owned)
            .collect(),
    })
}
