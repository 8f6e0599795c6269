// Settings read from the environment, optionally seeded from a .env file.

use crate::core::control::status::StatusNames;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

pub const ADDR: &str = "TIME_CONTROL_ADDR";
pub const STATUS_PENDING: &str = "TIME_CONTROL_STATUS_PENDING";
pub const STATUS_IN_PROGRESS: &str = "TIME_CONTROL_STATUS_IN_PROGRESS";
pub const STATUS_COMPLETED: &str = "TIME_CONTROL_STATUS_COMPLETED";
pub const TICK_MS: &str = "TIME_CONTROL_TICK_MS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} has an invalid value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub addr: SocketAddr,
    pub status_names: StatusNames,
    pub live_total_period: Duration,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(error) = dotenvy::dotenv() {
            if !error.not_found() {
                tracing::warn!(%error, "ignoring unreadable .env file");
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let addr = match lookup(ADDR) {
            Some(value) => value.parse::<SocketAddr>().map_err(|e| {
                ConfigError::Invalid {
                    key: ADDR,
                    reason: e.to_string(),
                    value,
                }
            })?,
            None => SocketAddr::from(([0, 0, 0, 0], 8080)),
        };

        let defaults = StatusNames::default();
        let name = |key: &'static str, fallback: String| -> Result<String, ConfigError> {
            match lookup(key) {
                Some(value) if value.trim().is_empty() => Err(ConfigError::Invalid {
                    key,
                    value,
                    reason: "status name must not be blank".into(),
                }),
                Some(value) => Ok(value),
                None => Ok(fallback),
            }
        };
        let status_names = StatusNames {
            pending: name(STATUS_PENDING, defaults.pending)?,
            in_progress: name(STATUS_IN_PROGRESS, defaults.in_progress)?,
            completed: name(STATUS_COMPLETED, defaults.completed)?,
        };

        let tick_ms = match lookup(TICK_MS) {
            Some(value) => match value.parse::<u64>() {
                Ok(0) => {
                    return Err(ConfigError::Invalid {
                        key: TICK_MS,
                        value,
                        reason: "must be greater than zero".into(),
                    });
                }
                Ok(ms) => ms,
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        key: TICK_MS,
                        reason: e.to_string(),
                        value,
                    });
                }
            },
            None => 1000,
        };

        Ok(Self {
            addr,
            status_names,
            live_total_period: Duration::from_millis(tick_ms),
        })
    }
}
