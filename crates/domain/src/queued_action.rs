use std::fmt::{Display, Formatter};
use std::str::FromStr;

use beacon_core::{AppError, AppResult, NonEmptyString};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Retry ceiling applied when the caller does not choose one.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Identifier assigned to a queued action at enqueue time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueuedActionId(Uuid);

impl QueuedActionId {
    /// Creates a random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for QueuedActionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for QueuedActionId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl FromStr for QueuedActionId {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|error| AppError::Validation(format!("invalid queued action id: {error}")))
    }
}

/// Kind of deferred operation carried by a queued action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum QueuedActionType {
    /// Report a new incident.
    CreateIncident,
    /// Change the status of an incident or unit.
    UpdateStatus,
    /// Attach an evidence item.
    UploadEvidence,
    /// Post an operational message.
    SendMessage,
    /// Any other operation tag understood by the replay endpoint.
    Custom(NonEmptyString),
}

impl QueuedActionType {
    /// Returns the stable tag for this action type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::CreateIncident => "create_incident",
            Self::UpdateStatus => "update_status",
            Self::UploadEvidence => "upload_evidence",
            Self::SendMessage => "send_message",
            Self::Custom(tag) => tag.as_str(),
        }
    }
}

impl FromStr for QueuedActionType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "create_incident" => Ok(Self::CreateIncident),
            "update_status" => Ok(Self::UpdateStatus),
            "upload_evidence" => Ok(Self::UploadEvidence),
            "send_message" => Ok(Self::SendMessage),
            other => NonEmptyString::new(other)
                .map(Self::Custom)
                .map_err(|_| AppError::Validation("queued action type must not be empty".to_owned())),
        }
    }
}

impl TryFrom<String> for QueuedActionType {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str(value.as_str())
    }
}

impl From<QueuedActionType> for String {
    fn from(value: QueuedActionType) -> Self {
        match value {
            QueuedActionType::Custom(tag) => tag.into(),
            known => known.as_str().to_owned(),
        }
    }
}

impl Display for QueuedActionType {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Caller-supplied part of a queued action.
#[derive(Debug, Clone, PartialEq)]
pub struct NewQueuedAction {
    action_type: QueuedActionType,
    payload: Value,
    priority: i32,
    max_retries: u32,
}

impl NewQueuedAction {
    /// Creates an action with priority 0 and the default retry ceiling.
    #[must_use]
    pub fn new(action_type: QueuedActionType, payload: Value) -> Self {
        Self {
            action_type,
            payload,
            priority: 0,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Sets the drain priority. Higher values drain first.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the retry ceiling.
    pub fn with_max_retries(mut self, max_retries: u32) -> AppResult<Self> {
        if max_retries == 0 {
            return Err(AppError::Validation(
                "queued action max_retries must be greater than zero".to_owned(),
            ));
        }

        self.max_retries = max_retries;
        Ok(self)
    }

    /// Returns the configured priority.
    #[must_use]
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Returns the configured retry ceiling.
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

/// Outcome of recording one failed replay attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDisposition {
    /// The action stays queued for a later drain.
    Retry,
    /// The retry ceiling was reached; the action must be dropped.
    Exhausted,
}

/// One deferred state-changing operation awaiting replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedAction {
    id: QueuedActionId,
    #[serde(rename = "type")]
    action_type: QueuedActionType,
    payload: Value,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    timestamp: DateTime<Utc>,
    priority: i32,
    retry_count: u32,
    max_retries: u32,
}

impl QueuedAction {
    /// Stamps a new action with a fresh id and enqueue time.
    #[must_use]
    pub fn enqueued(input: NewQueuedAction, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: QueuedActionId::new(),
            action_type: input.action_type,
            payload: input.payload,
            timestamp,
            priority: input.priority,
            retry_count: 0,
            max_retries: input.max_retries,
        }
    }

    /// Returns the action id.
    #[must_use]
    pub fn id(&self) -> QueuedActionId {
        self.id
    }

    /// Returns the action type.
    #[must_use]
    pub fn action_type(&self) -> &QueuedActionType {
        &self.action_type
    }

    /// Returns the replay payload.
    #[must_use]
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Returns the enqueue time.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns the drain priority.
    #[must_use]
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Returns the number of failed replay attempts so far.
    #[must_use]
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Returns the retry ceiling.
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Counts one failed replay and reports whether the action may stay queued.
    pub fn record_failed_attempt(&mut self) -> RetryDisposition {
        self.retry_count = self.retry_count.saturating_add(1);
        if self.retry_count < self.max_retries {
            RetryDisposition::Retry
        } else {
            RetryDisposition::Exhausted
        }
    }
}
