//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod http_action_replayer;
mod http_connectivity_probe;
mod in_memory_key_value_store;
mod logging_dropped_action_listener;
mod redis_key_value_store;

pub use http_action_replayer::HttpActionReplayer;
pub use http_connectivity_probe::HttpConnectivityProbe;
pub use in_memory_key_value_store::InMemoryKeyValueStore;
pub use logging_dropped_action_listener::LoggingDroppedActionListener;
pub use redis_key_value_store::{DEFAULT_REDIS_CONNECT_TIMEOUT, RedisKeyValueStore};
