//! Room Controller configuration.
//!
//! Configuration is loaded from environment variables. Every variable is
//! optional; values that are present but unparsable or out of range are
//! rejected rather than silently replaced by defaults.

use crate::actors::{RegistrySettings, RoomSettings};
use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default HTTP/WebSocket port.
pub const DEFAULT_PORT: u16 = 5174;

/// Default countdown length per turn, in ticks.
pub const DEFAULT_TURN_DURATION_TICKS: u32 = 30;

/// Default length of one countdown tick.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;

/// Default room capacity.
pub const DEFAULT_MAX_ROOMS: usize = 10_000;

/// Default room id length.
pub const DEFAULT_ROOM_ID_LENGTH: usize = 6;

/// Longest supported room id (one simple-format UUID).
pub const MAX_ROOM_ID_LENGTH: usize = 32;

/// Default number of id draws before giving up.
pub const DEFAULT_ROOM_ID_MAX_ATTEMPTS: u32 = 8;

/// Default RC instance ID prefix.
pub const DEFAULT_RC_ID_PREFIX: &str = "rc";

/// Room Controller configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Listener address for HTTP and WebSocket traffic.
    pub bind_address: String,

    /// Unique identifier for this RC instance (logs only).
    pub instance_id: String,

    /// Countdown length per turn, in ticks.
    pub turn_duration_ticks: u32,

    /// Length of one tick in milliseconds.
    pub tick_interval_ms: u64,

    /// Maximum live rooms.
    pub max_rooms: usize,

    /// Room id length in characters.
    pub room_id_length: usize,

    /// Id draws per room creation before failing.
    pub room_id_max_attempts: u32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = match (vars.get("RC_BIND_ADDRESS"), vars.get("PORT")) {
            (Some(address), _) => address.clone(),
            (None, Some(port)) => {
                let port: u16 = port
                    .parse()
                    .map_err(|e| ConfigError::InvalidValue(format!("PORT={port}: {e}")))?;
                format!("0.0.0.0:{port}")
            }
            (None, None) => format!("0.0.0.0:{DEFAULT_PORT}"),
        };

        let instance_id = vars.get("RC_INSTANCE_ID").cloned().unwrap_or_else(|| {
            let uuid_suffix = uuid::Uuid::new_v4().simple().to_string();
            let short_suffix = uuid_suffix.get(..8).unwrap_or("00000000");
            format!("{DEFAULT_RC_ID_PREFIX}-{short_suffix}")
        });

        let turn_duration_ticks =
            parse_var(vars, "RC_TURN_DURATION_TICKS", DEFAULT_TURN_DURATION_TICKS)?;
        let tick_interval_ms = parse_var(vars, "RC_TICK_INTERVAL_MS", DEFAULT_TICK_INTERVAL_MS)?;
        let max_rooms = parse_var(vars, "RC_MAX_ROOMS", DEFAULT_MAX_ROOMS)?;
        let room_id_length = parse_var(vars, "RC_ROOM_ID_LENGTH", DEFAULT_ROOM_ID_LENGTH)?;
        let room_id_max_attempts =
            parse_var(vars, "RC_ROOM_ID_MAX_ATTEMPTS", DEFAULT_ROOM_ID_MAX_ATTEMPTS)?;

        if turn_duration_ticks == 0 {
            return Err(ConfigError::InvalidValue(
                "RC_TURN_DURATION_TICKS must be at least 1".to_string(),
            ));
        }
        if tick_interval_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "RC_TICK_INTERVAL_MS must be at least 1".to_string(),
            ));
        }
        if max_rooms == 0 {
            return Err(ConfigError::InvalidValue(
                "RC_MAX_ROOMS must be at least 1".to_string(),
            ));
        }
        if !(1..=MAX_ROOM_ID_LENGTH).contains(&room_id_length) {
            return Err(ConfigError::InvalidValue(format!(
                "RC_ROOM_ID_LENGTH must be between 1 and {MAX_ROOM_ID_LENGTH}"
            )));
        }
        if room_id_max_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "RC_ROOM_ID_MAX_ATTEMPTS must be at least 1".to_string(),
            ));
        }

        Ok(Config {
            bind_address,
            instance_id,
            turn_duration_ticks,
            tick_interval_ms,
            max_rooms,
            room_id_length,
            room_id_max_attempts,
        })
    }

    /// Registry and room settings derived from this configuration.
    #[must_use]
    pub fn registry_settings(&self) -> RegistrySettings {
        RegistrySettings {
            max_rooms: self.max_rooms,
            room_id_length: self.room_id_length,
            room_id_max_attempts: self.room_id_max_attempts,
            room: RoomSettings {
                turn_duration: self.turn_duration_ticks,
                tick_interval: Duration::from_millis(self.tick_interval_ms),
            },
        }
    }
}

fn parse_var<T>(vars: &HashMap<String, String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match vars.get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ConfigError::InvalidValue(format!("{key}={raw}: {e}"))),
        None => Ok(default),
    }
}
