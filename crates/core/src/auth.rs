use serde::{Deserialize, Serialize};

/// Acting user as presented by the caller's authenticated session.
///
/// The role is carried as its transport value; resolving it against the
/// closed role set happens in the access-control layer so an unrecognised
/// role degrades to "no permissions" instead of failing the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorIdentity {
    user_id: String,
    role_name: String,
}

impl ActorIdentity {
    /// Creates an actor identity from session data.
    #[must_use]
    pub fn new(user_id: impl Into<String>, role_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role_name: role_name.into(),
        }
    }

    /// Returns the stable user identifier.
    #[must_use]
    pub fn user_id(&self) -> &str {
        self.user_id.as_str()
    }

    /// Returns the role transport value as supplied by the session.
    #[must_use]
    pub fn role_name(&self) -> &str {
        self.role_name.as_str()
    }
}
