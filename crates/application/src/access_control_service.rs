use std::sync::Arc;

use beacon_core::{ActorIdentity, AppError, AppResult};
use beacon_domain::{AccessContext, Action, PermissionGrant, Role, RolePermissionTable};
use tracing::debug;

/// Authorization decisions for one acting user.
///
/// Every check is a synchronous lookup against the shared read-only table, so
/// rendering paths may call it as often as they need to.
#[derive(Debug, Clone)]
pub struct AccessControl {
    table: Arc<RolePermissionTable>,
    role: Option<Role>,
    user_id: String,
}

impl AccessControl {
    /// Creates access control for an actor with a known role.
    #[must_use]
    pub fn new(table: Arc<RolePermissionTable>, role: Role, user_id: impl Into<String>) -> Self {
        Self {
            table,
            role: Some(role),
            user_id: user_id.into(),
        }
    }

    /// Creates access control from a role transport value.
    ///
    /// Unknown role values resolve to an actor without any grants.
    #[must_use]
    pub fn for_role_name(
        table: Arc<RolePermissionTable>,
        role_name: &str,
        user_id: impl Into<String>,
    ) -> Self {
        let user_id = user_id.into();
        let role = match role_name.parse::<Role>() {
            Ok(role) => Some(role),
            Err(error) => {
                debug!(user_id = %user_id, error = %error, "falling back to deny-all access");
                None
            }
        };

        Self {
            table,
            role,
            user_id,
        }
    }

    /// Creates access control for an authenticated actor.
    #[must_use]
    pub fn for_actor(table: Arc<RolePermissionTable>, actor: &ActorIdentity) -> Self {
        Self::for_role_name(table, actor.role_name(), actor.user_id())
    }

    /// Returns the resolved role, if the actor has a recognised one.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.role
    }

    /// Returns the acting user id.
    #[must_use]
    pub fn user_id(&self) -> &str {
        self.user_id.as_str()
    }

    /// Returns whether the actor may perform the action on the resource.
    #[must_use]
    pub fn has_permission(
        &self,
        resource: &str,
        action: Action,
        context: Option<&AccessContext>,
    ) -> bool {
        self.grant_for(resource)
            .is_some_and(|grant| grant.authorizes(action, self.user_id.as_str(), context))
    }

    /// Returns whether any grant exists for the resource, regardless of action.
    #[must_use]
    pub fn can_access_resource(&self, resource: &str) -> bool {
        self.grant_for(resource).is_some()
    }

    /// Lists resources visible to the actor in table order.
    #[must_use]
    pub fn accessible_resources(&self) -> Vec<&str> {
        self.grants().iter().map(PermissionGrant::resource).collect()
    }

    /// Ensures the actor may perform the action on the resource.
    pub fn require_permission(
        &self,
        resource: &str,
        action: Action,
        context: Option<&AccessContext>,
    ) -> AppResult<()> {
        if self.has_permission(resource, action, context) {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "user '{}' with role '{}' may not {} '{resource}'",
            self.user_id,
            self.role.map(|role| role.as_str()).unwrap_or("none"),
            action.as_str()
        )))
    }

    fn grants(&self) -> &[PermissionGrant] {
        match self.role {
            Some(role) => self.table.grants_for(role),
            None => &[],
        }
    }

    fn grant_for(&self, resource: &str) -> Option<&PermissionGrant> {
        self.role
            .and_then(|role| self.table.grant_for(role, resource))
    }
}
