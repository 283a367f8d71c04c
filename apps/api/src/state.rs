use std::sync::Arc;

use beacon_application::OfflineActionQueue;
use beacon_domain::RolePermissionTable;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub permission_table: Arc<RolePermissionTable>,
    pub offline_queue: Arc<OfflineActionQueue>,
    pub default_max_retries: u32,
}
