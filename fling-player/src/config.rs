//! Configuration for the fling-player daemon
//!
//! Bootstrap settings come from a TOML file resolved in this order:
//! 1. `--config` command-line argument
//! 2. `FLING_CONFIG` environment variable
//! 3. `<config dir>/fling/config.toml` when present
//! 4. Built-in defaults
//!
//! Command-line `--port`, `--bind` and `--log-level` override the file.

use crate::decoder::LoopbackConfig;
use crate::error::Result;
use crate::session::SessionOptions;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_ENV_VAR: &str = "FLING_CONFIG";

/// Settings loaded from the TOML file
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// HTTP server port
    pub port: u16,
    /// HTTP bind address
    pub bind: String,
    pub logging: LoggingConfig,
    pub session: SessionConfig,
    pub loopback: LoopbackConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: "127.0.0.1".to_string(),
            logging: LoggingConfig::default(),
            session: SessionConfig::default(),
            loopback: LoopbackConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Media session tuning
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Period between status broadcasts while playing, 0 disables them
    pub position_update_interval_ms: u64,
    /// Bound on decoder readiness waits, 0 waits indefinitely
    pub readiness_timeout_ms: u64,
    /// Number of volume steps of the software volume control
    pub max_volume_steps: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            position_update_interval_ms: 3000,
            readiness_timeout_ms: 0,
            max_volume_steps: 15,
        }
    }
}

impl SessionConfig {
    pub fn options(&self) -> SessionOptions {
        SessionOptions {
            position_update_interval: Duration::from_millis(self.position_update_interval_ms),
            readiness_timeout: (self.readiness_timeout_ms > 0)
                .then(|| Duration::from_millis(self.readiness_timeout_ms)),
        }
    }
}

fn default_port() -> u16 {
    5730
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Resolve and load the configuration file
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let path = fling_common::config::resolve_config_path(cli_path, CONFIG_ENV_VAR);
        Ok(fling_common::config::load_toml_or_default(path.as_deref())?)
    }

    /// `bind:port` socket address string
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}
