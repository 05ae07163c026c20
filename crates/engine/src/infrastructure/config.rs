//! Engine configuration loaded from the process environment.

use std::time::Duration;

/// Errors raised while reading or validating configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
    #[error("{key} must be greater than zero")]
    Zero { key: &'static str },
    #[error("WS_PING_PERIOD_SECS ({ping}s) must be shorter than WS_PONG_WAIT_SECS ({pong}s)")]
    PingNotShorterThanPong { ping: u64, pong: u64 },
}

/// Timing and size limits for one socket connection's pump pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PumpConfig {
    /// Capacity of the per-client outbound queue.
    pub client_queue: usize,
    /// Deadline for a single write to the peer.
    pub write_wait: Duration,
    /// Time allowed between frames from the peer before the read side gives up.
    pub pong_wait: Duration,
    /// Keepalive interval. Must be shorter than `pong_wait`.
    pub ping_period: Duration,
    /// Largest inbound message accepted from the peer.
    pub max_message_bytes: usize,
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            client_queue: 256,
            write_wait: Duration::from_secs(10),
            pong_wait: Duration::from_secs(60),
            ping_period: Duration::from_secs(54),
            max_message_bytes: 512,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub server_host: String,
    pub server_port: u16,
    /// Per-subscriber delivery channel capacity of the shop event bus.
    pub event_bus_capacity: usize,
    pub pump: PumpConfig,
    pub cors_allowed_origins: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".into(),
            server_port: 3000,
            event_bus_capacity: crate::infrastructure::event_bus::DEFAULT_CAPACITY,
            pump: PumpConfig::default(),
            cors_allowed_origins: None,
        }
    }
}

impl EngineConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup, falling back to defaults
    /// for anything unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let lookup = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let server_host = lookup("SERVER_HOST").unwrap_or(defaults.server_host);
        let server_port = parse_or(&lookup, "SERVER_PORT", defaults.server_port)?;
        let event_bus_capacity =
            parse_or(&lookup, "EVENT_BUS_CAPACITY", defaults.event_bus_capacity)?;

        let pump = PumpConfig {
            client_queue: parse_or(&lookup, "WS_CLIENT_QUEUE", defaults.pump.client_queue)?,
            write_wait: Duration::from_secs(parse_or(
                &lookup,
                "WS_WRITE_WAIT_SECS",
                defaults.pump.write_wait.as_secs(),
            )?),
            pong_wait: Duration::from_secs(parse_or(
                &lookup,
                "WS_PONG_WAIT_SECS",
                defaults.pump.pong_wait.as_secs(),
            )?),
            ping_period: Duration::from_secs(parse_or(
                &lookup,
                "WS_PING_PERIOD_SECS",
                defaults.pump.ping_period.as_secs(),
            )?),
            max_message_bytes: parse_or(
                &lookup,
                "WS_MAX_MESSAGE_BYTES",
                defaults.pump.max_message_bytes,
            )?,
        };

        let config = Self {
            server_host,
            server_port,
            event_bus_capacity,
            pump,
            cors_allowed_origins: lookup("CORS_ALLOWED_ORIGINS"),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.event_bus_capacity == 0 {
            return Err(ConfigError::Zero {
                key: "EVENT_BUS_CAPACITY",
            });
        }
        if self.pump.client_queue == 0 {
            return Err(ConfigError::Zero {
                key: "WS_CLIENT_QUEUE",
            });
        }
        if self.pump.write_wait.is_zero() {
            return Err(ConfigError::Zero {
                key: "WS_WRITE_WAIT_SECS",
            });
        }
        if self.pump.ping_period.is_zero() {
            return Err(ConfigError::Zero {
                key: "WS_PING_PERIOD_SECS",
            });
        }
        if self.pump.max_message_bytes == 0 {
            return Err(ConfigError::Zero {
                key: "WS_MAX_MESSAGE_BYTES",
            });
        }
        if self.pump.ping_period >= self.pump.pong_wait {
            return Err(ConfigError::PingNotShorterThanPong {
                ping: self.pump.ping_period.as_secs(),
                pong: self.pump.pong_wait.as_secs(),
            });
        }
        Ok(())
    }
}

fn parse_or<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        None => Ok(default),
    }
}
