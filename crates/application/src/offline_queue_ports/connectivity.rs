use serde::{Deserialize, Serialize};

/// Reachability of the backing service as reported by the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    /// The backing service is reachable.
    Online,
    /// The backing service is unreachable.
    Offline,
}

impl Connectivity {
    /// Maps a reachability flag into a connectivity value.
    #[must_use]
    pub fn from_reachable(reachable: bool) -> Self {
        if reachable { Self::Online } else { Self::Offline }
    }

    /// Returns whether this value is online.
    #[must_use]
    pub fn is_online(self) -> bool {
        matches!(self, Self::Online)
    }

    /// Returns a stable transport value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
        }
    }
}
