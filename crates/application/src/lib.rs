//! Application services and ports.

#![forbid(unsafe_code)]

mod access_control_service;
mod offline_queue_ports;
mod offline_queue_service;

pub use access_control_service::AccessControl;
pub use offline_queue_ports::{ActionReplayer, Connectivity, DroppedActionListener, KeyValueStore};
pub use offline_queue_service::{
    DEFAULT_QUEUE_STORAGE_KEY, OfflineActionQueue, OfflineQueueConfig, QueueState,
    SyncOutcome, SyncReport, SyncSkipReason,
};
