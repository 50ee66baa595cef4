//! Process configuration read from the environment.
//!
//! | variable                   | default        |
//! |----------------------------|----------------|
//! | `BIND_ADDR`                | `0.0.0.0:3000` |
//! | `USE_PERSISTENT_STORES`    | `false`        |
//! | `DATABASE_URL`             | required when persistent |
//! | `DATABASE_MAX_CONNECTIONS` | `10`           |
//! | `STORE_TIMEOUT_MS`         | `5000`         |
//! | `BOOTSTRAP_MAX_ATTEMPTS`   | `5`            |
//! | `BOOTSTRAP_RETRY_DELAY_MS` | `2000`         |
//! | `BOOTSTRAP_BACKOFF`        | `fixed`        |
//! | `BOOTSTRAP_MAX_DELAY_MS`   | `30000`        |

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::item_store::DEFAULT_STORE_TIMEOUT;
use crate::retry::{BackoffStrategy, RetryPolicy};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Which item store adapter the process runs against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    InMemory,
    Postgres {
        database_url: String,
        max_connections: u32,
    },
}

impl StoreBackend {
    pub fn name(&self) -> &'static str {
        match self {
            StoreBackend::InMemory => "in_memory",
            StoreBackend::Postgres { .. } => "postgres",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Per round-trip bound, also used as the pool acquire timeout.
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub store: StoreConfig,
    pub bootstrap: RetryPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            store: StoreConfig {
                backend: StoreBackend::InMemory,
                timeout: DEFAULT_STORE_TIMEOUT,
            },
            bootstrap: RetryPolicy {
                max_delay: Duration::from_secs(30),
                ..RetryPolicy::default()
            },
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = parse_or(&get, "BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000)))?;

        let use_persistent = match get("USE_PERSISTENT_STORES") {
            None => false,
            Some(raw) => parse_bool("USE_PERSISTENT_STORES", &raw)?,
        };
        let backend = if use_persistent {
            StoreBackend::Postgres {
                database_url: get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
                max_connections: parse_or(&get, "DATABASE_MAX_CONNECTIONS", 10u32)?,
            }
        } else {
            StoreBackend::InMemory
        };

        let timeout = Duration::from_millis(parse_or(&get, "STORE_TIMEOUT_MS", 5000u64)?);
        if timeout.is_zero() {
            return Err(ConfigError::Invalid {
                key: "STORE_TIMEOUT_MS",
                reason: "must be greater than zero".to_string(),
            });
        }

        let bootstrap = RetryPolicy {
            max_attempts: parse_or(&get, "BOOTSTRAP_MAX_ATTEMPTS", 5u32)?,
            base_delay: Duration::from_millis(parse_or(&get, "BOOTSTRAP_RETRY_DELAY_MS", 2000u64)?),
            max_delay: Duration::from_millis(parse_or(&get, "BOOTSTRAP_MAX_DELAY_MS", 30_000u64)?),
            strategy: match get("BOOTSTRAP_BACKOFF") {
                None => BackoffStrategy::Fixed,
                Some(raw) => raw.parse().map_err(|reason| ConfigError::Invalid {
                    key: "BOOTSTRAP_BACKOFF",
                    reason,
                })?,
            },
        };

        Ok(Self {
            bind_addr,
            store: StoreConfig { backend, timeout },
            bootstrap,
        })
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
    }
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Invalid {
            key,
            reason: format!("'{other}' is not a boolean"),
        }),
    }
}
