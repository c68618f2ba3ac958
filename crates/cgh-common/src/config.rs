//! Configuration structures for the monitor.
//!
//! Supports TOML deserialization with defaults that match the CGH Aparecida
//! deployment, so an empty file is a valid configuration.

use crate::registry::{Registry, Selection};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Top-level monitor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Backend endpoint configuration.
    pub backend: BackendConfig,

    /// Polling cadence.
    pub polling: PollingConfig,

    /// Which controller to monitor.
    pub selection: Selection,

    /// Per-value status thresholds.
    pub thresholds: Thresholds,

    /// Plant-wide status rules.
    pub plant_status: PlantStatusRules,

    /// Web UI server configuration.
    pub web: WebConfig,

    /// Registry file replacing the built-in registry.
    pub registry_file: Option<PathBuf>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            polling: PollingConfig::default(),
            selection: Selection::new("aparecida", "principal", "ug01"),
            thresholds: Thresholds::default(),
            plant_status: PlantStatusRules::default(),
            web: WebConfig::default(),
            registry_file: None,
        }
    }
}

/// Backend endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Full URL of the read endpoint.
    pub url: String,

    /// Per-request timeout.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: String::from("http://localhost:8010/readclp"),
            timeout: Duration::from_secs(5),
        }
    }
}

/// What an automatic tick does while another fetch is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OverlapPolicy {
    /// Issue the fetch anyway; the last fetch to settle wins.
    #[default]
    Allow,
    /// Drop the tick.
    Skip,
}

/// Polling cadence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Interval between automatic fetches (zero disables the timer).
    #[serde(with = "humantime_serde")]
    pub interval: Duration,

    /// Fetch immediately and start the timer when the session is created.
    pub auto_start: bool,

    /// Behavior of automatic ticks that overlap an outstanding fetch.
    pub overlap: OverlapPolicy,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(5000),
            auto_start: true,
            overlap: OverlapPolicy::Allow,
        }
    }
}

/// Thresholds for per-value status indicators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Values at or above this are a warning.
    pub warning: f64,
    /// Values at or above this are critical.
    pub critical: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            warning: 70.0,
            critical: 90.0,
        }
    }
}

/// Rules for the plant-wide status badge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlantStatusRules {
    /// Any temperature reading strictly above this raises an alert.
    pub temperature_alert: f64,
    /// Pressure readings strictly below this call for attention.
    pub pressure_attention: f64,
    /// `REAL` registers checked against `pressure_attention`.
    pub pressure_registers: Vec<String>,
}

impl Default for PlantStatusRules {
    fn default() -> Self {
        Self {
            temperature_alert: 65.0,
            pressure_attention: 100.0,
            pressure_registers: vec![
                String::from("UHLM_PressaoOleo"),
                String::from("UHRV_PressaoOleo"),
            ],
        }
    }
}

/// Web UI server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Address to bind the server to.
    pub bind_addr: SocketAddr,
    /// Enable permissive CORS.
    pub enable_cors: bool,
    /// WebSocket broadcast channel capacity.
    pub ws_channel_capacity: usize,
    /// Directory served under `/static`.
    pub static_dir: Option<PathBuf>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            enable_cors: true,
            ws_channel_capacity: 256,
            static_dir: None,
        }
    }
}

impl MonitorConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or fails validation.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "backend.timeout must be greater than zero".into(),
            ));
        }
        if self.backend.url.trim().is_empty() {
            return Err(ConfigError::Invalid("backend.url must not be empty".into()));
        }
        if self.web.ws_channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "web.ws_channel_capacity must be greater than zero".into(),
            ));
        }
        if self.thresholds.warning >= self.thresholds.critical {
            return Err(ConfigError::Invalid(format!(
                "thresholds.warning ({}) must be below thresholds.critical ({})",
                self.thresholds.warning, self.thresholds.critical
            )));
        }
        Ok(())
    }

    /// The registry named by `registry_file`, or the built-in one.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry file cannot be loaded.
    pub fn load_registry(&self) -> Result<Registry, ConfigError> {
        match &self.registry_file {
            Some(path) => Registry::from_file(path),
            None => Ok(Registry::builtin()),
        }
    }
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("failed to serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Semantically invalid configuration.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Serde helper module for `Duration` using humantime format.
mod humantime_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = humantime::format_duration(*duration).to_string();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
