use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use beacon_application::DEFAULT_QUEUE_STORAGE_KEY;
use beacon_core::AppError;
use beacon_domain::DEFAULT_MAX_RETRIES;
use tracing_subscriber::EnvFilter;

/// Backing store for the persisted offline queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueStoreConfig {
    Memory,
    Redis { url: String },
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub api_host: String,
    pub api_port: u16,
    pub frontend_url: String,
    pub queue_store: QueueStoreConfig,
    pub queue_storage_key: String,
    pub default_max_retries: u32,
    pub replay_endpoint_url: String,
    pub replay_timeout_ms: u64,
    pub connectivity_health_url: String,
    pub connectivity_poll_interval_ms: u64,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let api_host = lookup("API_HOST").unwrap_or_else(|| "127.0.0.1".to_owned());
        let api_port = parse_or("API_PORT", &lookup, 3001_u16)?;
        let frontend_url =
            lookup("FRONTEND_URL").unwrap_or_else(|| "http://localhost:3000".to_owned());

        let queue_store = match lookup("QUEUE_STORE")
            .unwrap_or_else(|| "memory".to_owned())
            .as_str()
        {
            "memory" => QueueStoreConfig::Memory,
            "redis" => QueueStoreConfig::Redis {
                url: required_non_empty(&lookup, "REDIS_URL")?,
            },
            other => {
                return Err(AppError::Validation(format!(
                    "QUEUE_STORE must be either 'memory' or 'redis', got '{other}'"
                )));
            }
        };

        let queue_storage_key = lookup("QUEUE_STORAGE_KEY")
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_QUEUE_STORAGE_KEY.to_owned());
        let default_max_retries =
            parse_or("QUEUE_DEFAULT_MAX_RETRIES", &lookup, DEFAULT_MAX_RETRIES)?;
        let replay_endpoint_url = required_non_empty(&lookup, "REPLAY_ENDPOINT_URL")?;
        let replay_timeout_ms = parse_or("REPLAY_TIMEOUT_MS", &lookup, 10_000_u64)?;
        let connectivity_health_url = required_non_empty(&lookup, "CONNECTIVITY_HEALTH_URL")?;
        let connectivity_poll_interval_ms =
            parse_or("CONNECTIVITY_POLL_INTERVAL_MS", &lookup, 5_000_u64)?;

        if default_max_retries == 0 {
            return Err(AppError::Validation(
                "QUEUE_DEFAULT_MAX_RETRIES must be greater than zero".to_owned(),
            ));
        }

        if replay_timeout_ms == 0 {
            return Err(AppError::Validation(
                "REPLAY_TIMEOUT_MS must be greater than zero".to_owned(),
            ));
        }

        if connectivity_poll_interval_ms == 0 {
            return Err(AppError::Validation(
                "CONNECTIVITY_POLL_INTERVAL_MS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            api_host,
            api_port,
            frontend_url,
            queue_store,
            queue_storage_key,
            default_max_retries,
            replay_endpoint_url,
            replay_timeout_ms,
            connectivity_health_url,
            connectivity_poll_interval_ms,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Validation(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_non_empty(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<String, AppError> {
    let value = lookup(name).ok_or_else(|| AppError::Validation(format!("{name} is required")))?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value.trim_end_matches('/').to_owned())
}

fn parse_or<T>(
    name: &str,
    lookup: &impl Fn(&str) -> Option<String>,
    default: T,
) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(value) => value.trim().parse::<T>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        None => Ok(default),
    }
}
