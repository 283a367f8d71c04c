use std::collections::BTreeSet;
use std::str::FromStr;

use beacon_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Actor kinds recognised by the dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Control room operator.
    Operator,
    /// Dispatches units to incidents.
    Dispatcher,
    /// Responder working in the field.
    FieldResponder,
    /// Leads one response unit.
    UnitLead,
    /// Case investigator.
    Investigator,
    /// Legal counsel reviewing case material.
    Legal,
    /// Shift or station supervisor.
    Supervisor,
    /// Read-mostly compliance auditor.
    Auditor,
}

impl Role {
    /// Returns a stable transport value for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Operator => "operator",
            Self::Dispatcher => "dispatcher",
            Self::FieldResponder => "field_responder",
            Self::UnitLead => "unit_lead",
            Self::Investigator => "investigator",
            Self::Legal => "legal",
            Self::Supervisor => "supervisor",
            Self::Auditor => "auditor",
        }
    }

    /// Returns all known roles.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Role] = &[
            Role::Operator,
            Role::Dispatcher,
            Role::FieldResponder,
            Role::UnitLead,
            Role::Investigator,
            Role::Legal,
            Role::Supervisor,
            Role::Auditor,
        ];

        ALL
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|role| role.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown role value '{value}'")))
    }
}

/// Operations a grant may allow on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// View records.
    Read,
    /// Create or update records.
    Write,
    /// Remove records.
    Delete,
    /// Export records outside the console.
    Export,
    /// Redact sensitive content in records.
    Redact,
}

impl Action {
    /// Returns a stable transport value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Delete => "delete",
            Self::Export => "export",
            Self::Redact => "redact",
        }
    }

    /// Returns all known actions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Action] = &[
            Action::Read,
            Action::Write,
            Action::Delete,
            Action::Export,
            Action::Redact,
        ];

        ALL
    }
}

impl FromStr for Action {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|action| action.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown action value '{value}'")))
    }
}

/// Per-request facts a grant condition may be evaluated against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessContext {
    /// Owner of the record being accessed, when the caller knows it.
    pub record_owner_id: Option<String>,
}

impl AccessContext {
    /// Creates a context scoped to one record owner.
    #[must_use]
    pub fn for_record_owner(owner_id: impl Into<String>) -> Self {
        Self {
            record_owner_id: Some(owner_id.into()),
        }
    }
}

/// Extra restriction attached to a grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GrantCondition {
    /// Grant only applies to records owned by the acting user.
    OwnRecordsOnly,
}

impl GrantCondition {
    /// Evaluates the condition for one actor and request context.
    #[must_use]
    pub fn is_satisfied(&self, actor_user_id: &str, context: Option<&AccessContext>) -> bool {
        match self {
            Self::OwnRecordsOnly => context
                .and_then(|context| context.record_owner_id.as_deref())
                .is_some_and(|owner_id| owner_id == actor_user_id),
        }
    }
}

/// Actions a role may perform on one named resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrant {
    resource: String,
    actions: BTreeSet<Action>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    conditions: Vec<GrantCondition>,
}

impl PermissionGrant {
    /// Creates a grant without conditions.
    pub fn new(
        resource: impl Into<String>,
        actions: impl IntoIterator<Item = Action>,
    ) -> AppResult<Self> {
        let resource = resource.into();
        if resource.trim().is_empty() {
            return Err(AppError::Validation(
                "grant resource must not be empty".to_owned(),
            ));
        }

        Ok(Self {
            resource,
            actions: actions.into_iter().collect(),
            conditions: Vec::new(),
        })
    }

    pub(crate) fn from_static(resource: &'static str, actions: &[Action]) -> Self {
        Self {
            resource: resource.to_owned(),
            actions: actions.iter().copied().collect(),
            conditions: Vec::new(),
        }
    }

    /// Attaches a condition to the grant. Repeated conditions are ignored.
    #[must_use]
    pub fn with_condition(mut self, condition: GrantCondition) -> Self {
        if !self.conditions.contains(&condition) {
            self.conditions.push(condition);
        }
        self
    }

    /// Restricts the grant to records owned by the acting user.
    #[must_use]
    pub fn own_records_only(self) -> Self {
        self.with_condition(GrantCondition::OwnRecordsOnly)
    }

    /// Returns the resource name.
    #[must_use]
    pub fn resource(&self) -> &str {
        self.resource.as_str()
    }

    /// Returns the allowed actions.
    #[must_use]
    pub fn actions(&self) -> &BTreeSet<Action> {
        &self.actions
    }

    /// Returns the attached conditions.
    #[must_use]
    pub fn conditions(&self) -> &[GrantCondition] {
        self.conditions.as_slice()
    }

    /// Returns whether the action is in the allowed set, ignoring conditions.
    #[must_use]
    pub fn allows(&self, action: Action) -> bool {
        self.actions.contains(&action)
    }

    /// Returns whether the grant authorizes the action for the actor.
    #[must_use]
    pub fn authorizes(
        &self,
        action: Action,
        actor_user_id: &str,
        context: Option<&AccessContext>,
    ) -> bool {
        self.allows(action)
            && self
                .conditions
                .iter()
                .all(|condition| condition.is_satisfied(actor_user_id, context))
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{AccessContext, Action, GrantCondition, PermissionGrant, Role};

    #[test]
    fn role_roundtrip_transport_value() {
        for role in Role::all() {
            let restored = Role::from_str(role.as_str());
            assert_eq!(restored.ok(), Some(*role));
        }
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!(Role::from_str("tourist").is_err());
        assert!(Role::from_str("").is_err());
    }

    #[test]
    fn unknown_action_is_rejected() {
        assert!(Action::from_str("approve").is_err());
        assert_eq!(Action::from_str("redact").ok(), Some(Action::Redact));
    }

    #[test]
    fn grant_rejects_blank_resource() {
        assert!(PermissionGrant::new("  ", [Action::Read]).is_err());
    }

    #[test]
    fn grant_with_empty_action_set_denies_everything() {
        let grant = PermissionGrant::new("incidents", []);
        assert!(grant.is_ok());
        let Ok(grant) = grant else { return };

        for action in Action::all() {
            assert!(!grant.authorizes(*action, "user-1", None));
        }
    }

    #[test]
    fn own_records_condition_compares_owner_by_value() {
        let owner = String::from("user-42");
        let context = AccessContext::for_record_owner(owner.clone());

        assert!(GrantCondition::OwnRecordsOnly.is_satisfied("user-42", Some(&context)));
        assert!(!GrantCondition::OwnRecordsOnly.is_satisfied("user-99", Some(&context)));
        assert!(!GrantCondition::OwnRecordsOnly.is_satisfied("user-42", None));
        assert!(!GrantCondition::OwnRecordsOnly.is_satisfied(
            "user-42",
            Some(&AccessContext::default())
        ));
    }

    #[test]
    fn repeated_condition_is_stored_once() {
        let grant = PermissionGrant::new("evidence", [Action::Read])
            .map(|grant| grant.own_records_only().own_records_only());
        assert_eq!(
            grant.ok().map(|grant| grant.conditions().len()),
            Some(1)
        );
    }
}
