//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod permission_table;
mod queued_action;
mod security;

pub use permission_table::{RolePermissionTable, resources};
pub use queued_action::{
    DEFAULT_MAX_RETRIES, NewQueuedAction, QueuedAction, QueuedActionId, QueuedActionType,
    RetryDisposition,
};
pub use security::{AccessContext, Action, GrantCondition, PermissionGrant, Role};
