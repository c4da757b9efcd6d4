//! Configuration management for lightfinder.
//!
//! This module provides the configuration system used at startup:
//! - Loading from YAML files
//! - Environment variable overrides (`LIGHTFINDER__SECTION__FIELD`)
//! - Validation of all settings
//! - HTTP listener, discovery, and logging settings

use crate::discovery_config::DiscoveryConfig;
use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::Level;

/// Prefix for environment variable overrides
pub const ENV_PREFIX: &str = "LIGHTFINDER";

/// Main application configuration.
///
/// # Examples
///
/// ```
/// use lightfinder_core::config::AppConfig;
///
/// let config = AppConfig::from_yaml("http:\n  port: 9000\n").unwrap();
/// assert_eq!(config.http.port, 9000);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP query surface
    #[serde(default)]
    pub http: HttpConfig,

    /// Device discovery
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Loads configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path.display().to_string()).into());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Self::from_yaml(&contents)
    }

    /// Loads configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| {
            ConfigError::InvalidFormat {
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Loads configuration using the `config` crate: an optional YAML file
    /// layered under `LIGHTFINDER__*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(ConfigError::file_not_found(path.display().to_string()).into());
            }
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let source = path
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<environment>".to_string());

        let config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| ConfigError::LoadFailed {
                path: source,
                reason: e.to_string(),
            })?;

        config.try_deserialize().map_err(|e| {
            ConfigError::InvalidFormat {
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        self.http.validate()?;

        self.discovery
            .validate()
            .map_err(|reason| ConfigError::invalid_value("discovery", reason))?;

        self.logging.parse_level()?;

        Ok(())
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Listen address
    #[serde(default = "default_http_host")]
    pub host: String,

    /// Listen port
    #[serde(default = "default_http_port")]
    pub port: u16,
}

fn default_http_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8000
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_http_host(),
            port: default_http_port(),
        }
    }
}

impl HttpConfig {
    /// Validates the HTTP configuration.
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(ConfigError::invalid_value("http.port", "cannot be 0").into());
        }

        if self.host.is_empty() {
            return Err(ConfigError::invalid_value("http.host", "cannot be empty").into());
        }

        Ok(())
    }

    /// Returns the bind address as a string.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "text" or "json"
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> LogFormat {
    LogFormat::Text
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    /// Parses the log level string to a tracing Level.
    pub fn parse_level(&self) -> Result<Level> {
        self.level.parse().map_err(|_| {
            let reason = format!("Invalid log level: {}", self.level);
            ConfigError::invalid_value("logging.level", reason).into()
        })
    }
}

/// Log format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text format
    Text,
    /// JSON format for structured logging
    Json,
}
