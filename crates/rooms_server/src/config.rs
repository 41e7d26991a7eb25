//! Server configuration.

use crate::room::TurnPolicy;
use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Runtime configuration, read from TOML and overridden from the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Setters, Serialize, Deserialize)]
#[setters(prefix = "with_")]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    host: String,

    /// Port to bind.
    port: u16,

    /// Milliseconds between snapshots on a state stream.
    poll_interval_ms: u64,

    /// Snapshots buffered per stream before the publisher waits.
    stream_buffer: usize,

    /// Turn enforcement on moves.
    turn_policy: TurnPolicy,

    /// Idle seconds before a room is closed. No expiry when absent.
    #[setters(strip_option)]
    room_ttl_secs: Option<u64>,

    /// Seconds between expiry sweeps.
    sweep_interval_secs: u64,

    /// Default tracing filter when `RUST_LOG` is unset.
    log_filter: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 50051,
            poll_interval_ms: 1000,
            stream_buffer: 8,
            turn_policy: TurnPolicy::Strict,
            room_ttl_secs: None,
            sweep_interval_secs: 60,
            log_filter: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a TOML file. Missing keys take defaults.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        info!(bind = %config.bind_addr(), "Config loaded successfully");
        Ok(config)
    }

    /// Loads `path` if given, otherwise returns defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Rejects values the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::new("poll_interval_ms must be positive".to_string()));
        }
        if self.stream_buffer == 0 {
            return Err(ConfigError::new("stream_buffer must be positive".to_string()));
        }
        if self.sweep_interval_secs == 0 {
            return Err(ConfigError::new("sweep_interval_secs must be positive".to_string()));
        }
        if self.room_ttl_secs == Some(0) {
            return Err(ConfigError::new("room_ttl_secs must be positive".to_string()));
        }
        Ok(())
    }

    /// `host:port` to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Poll interval as a duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Room time-to-live, if expiry is enabled.
    pub fn room_ttl(&self) -> Option<Duration> {
        self.room_ttl_secs.map(Duration::from_secs)
    }

    /// Interval between expiry sweeps.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Renders the configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self)
            .map_err(|e| ConfigError::new(format!("Failed to render config: {}", e)))
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ServerConfig::default();
        config.validate().unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:50051");
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.room_ttl(), None);
    }

    #[test]
    fn test_setters_override() {
        let config = ServerConfig::default()
            .with_port(8080)
            .with_turn_policy(TurnPolicy::Permissive)
            .with_room_ttl_secs(600);
        assert_eq!(*config.port(), 8080);
        assert_eq!(*config.turn_policy(), TurnPolicy::Permissive);
        assert_eq!(config.room_ttl(), Some(Duration::from_secs(600)));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = ServerConfig::default().with_poll_interval_ms(0);
        let err = config.validate().unwrap_err();
        assert!(err.message.contains("poll_interval_ms"));
    }

    #[test]
    fn test_toml_round_trip_keeps_policy() {
        let config = ServerConfig::default().with_turn_policy(TurnPolicy::Permissive);
        let text = config.to_toml().unwrap();
        assert!(text.contains("turn_policy = \"permissive\""));
        let parsed: ServerConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
