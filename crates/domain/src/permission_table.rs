use std::collections::{BTreeMap, HashSet};

use beacon_core::{AppError, AppResult};

use crate::security::{Action, PermissionGrant, Role};

/// Resource names used by the standard dashboards.
pub mod resources {
    /// Reported incidents and their status history.
    pub const INCIDENTS: &str = "incidents";
    /// Evidence items attached to incidents or cases.
    pub const EVIDENCE: &str = "evidence";
    /// Response units and their assignments.
    pub const UNITS: &str = "units";
    /// Operational chat messages.
    pub const MESSAGES: &str = "messages";
    /// Public and tourist-facing safety alerts.
    pub const ALERTS: &str = "alerts";
    /// Investigation case files.
    pub const CASES: &str = "cases";
    /// Shift and incident reports.
    pub const REPORTS: &str = "reports";
    /// Access and change audit trail.
    pub const AUDIT_LOGS: &str = "audit_logs";
}

/// Immutable mapping from role to its ordered grants.
///
/// Holds at most one grant per (role, resource) pair, so resource lookup
/// always resolves to a single grant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RolePermissionTable {
    grants: BTreeMap<Role, Vec<PermissionGrant>>,
}

impl RolePermissionTable {
    /// Creates a validated table from role entries.
    ///
    /// A role listed more than once has its grants concatenated in order.
    pub fn new(
        entries: impl IntoIterator<Item = (Role, Vec<PermissionGrant>)>,
    ) -> AppResult<Self> {
        let mut grants: BTreeMap<Role, Vec<PermissionGrant>> = BTreeMap::new();
        for (role, role_grants) in entries {
            grants.entry(role).or_default().extend(role_grants);
        }

        for (role, role_grants) in &grants {
            let mut seen = HashSet::new();
            for grant in role_grants {
                if !seen.insert(grant.resource()) {
                    return Err(AppError::Conflict(format!(
                        "role '{}' has more than one grant for resource '{}'",
                        role.as_str(),
                        grant.resource()
                    )));
                }
            }
        }

        Ok(Self { grants })
    }

    /// Returns a table without any grants.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the grant for one resource under a role, if any.
    #[must_use]
    pub fn grant_for(&self, role: Role, resource: &str) -> Option<&PermissionGrant> {
        self.grants_for(role)
            .iter()
            .find(|grant| grant.resource() == resource)
    }

    /// Returns all grants of a role in table order.
    #[must_use]
    pub fn grants_for(&self, role: Role) -> &[PermissionGrant] {
        self.grants.get(&role).map(Vec::as_slice).unwrap_or_default()
    }

    /// Returns the roles that have at least one entry.
    pub fn roles(&self) -> impl Iterator<Item = Role> + '_ {
        self.grants.keys().copied()
    }

    /// Returns the permission table used by the safety dashboards.
    #[must_use]
    pub fn standard() -> Self {
        use Action::{Delete, Export, Read, Redact, Write};
        use self::resources::{
            ALERTS, AUDIT_LOGS, CASES, EVIDENCE, INCIDENTS, MESSAGES, REPORTS, UNITS,
        };

        let grant = PermissionGrant::from_static;
        let grants = BTreeMap::from([
            (
                Role::Operator,
                vec![
                    grant(INCIDENTS, &[Read, Write]),
                    grant(ALERTS, &[Read, Write]),
                    grant(UNITS, &[Read]),
                    grant(MESSAGES, &[Read, Write]),
                ],
            ),
            (
                Role::Dispatcher,
                vec![
                    grant(INCIDENTS, &[Read, Write]),
                    grant(UNITS, &[Read, Write]),
                    grant(ALERTS, &[Read, Write]),
                    grant(MESSAGES, &[Read, Write]),
                ],
            ),
            (
                Role::FieldResponder,
                vec![
                    grant(INCIDENTS, &[Read, Write]),
                    grant(EVIDENCE, &[Read, Write]).own_records_only(),
                    grant(UNITS, &[Read]),
                    grant(MESSAGES, &[Read, Write]),
                ],
            ),
            (
                Role::UnitLead,
                vec![
                    grant(INCIDENTS, &[Read, Write]),
                    grant(EVIDENCE, &[Read]),
                    grant(UNITS, &[Read, Write]),
                    grant(MESSAGES, &[Read, Write]),
                    grant(REPORTS, &[Read, Write]),
                ],
            ),
            (
                Role::Investigator,
                vec![
                    grant(INCIDENTS, &[Read]),
                    grant(EVIDENCE, &[Read, Write, Export]),
                    grant(CASES, &[Read, Write]).own_records_only(),
                    grant(REPORTS, &[Read, Write]),
                ],
            ),
            (
                Role::Legal,
                vec![
                    grant(EVIDENCE, &[Read, Export, Redact]),
                    grant(CASES, &[Read]),
                    grant(REPORTS, &[Read, Export]),
                ],
            ),
            (
                Role::Supervisor,
                vec![
                    grant(INCIDENTS, &[Read, Write, Delete, Export]),
                    grant(EVIDENCE, &[Read, Export]),
                    grant(UNITS, &[Read, Write, Delete]),
                    grant(ALERTS, &[Read, Write, Delete]),
                    grant(MESSAGES, &[Read, Write]),
                    grant(CASES, &[Read]),
                    grant(REPORTS, &[Read, Write, Export]),
                    grant(AUDIT_LOGS, &[Read]),
                ],
            ),
            (
                Role::Auditor,
                vec![
                    grant(INCIDENTS, &[Read]),
                    grant(EVIDENCE, &[Read]),
                    grant(REPORTS, &[Read]),
                    grant(AUDIT_LOGS, &[Read, Export]),
                ],
            ),
        ]);

        Self { grants }
    }
}
