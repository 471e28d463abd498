use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::timeouts::HANDSHAKE_TIMEOUT;

/// Default connect path on the device API.
pub const DEFAULT_CONNECT_PATH: &str = "/api/devices/v1/deviceconnect/connect";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub connection: ConnectionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// HTTP(S) origin of the server, e.g. `https://hosted.example.io`
    pub server_url: String,
    pub connect_path: String,
    /// Bearer token presented during the handshake
    pub token: String,
    pub handshake_timeout_seconds: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            server_url: String::new(),
            connect_path: DEFAULT_CONNECT_PATH.to_string(),
            token: String::new(),
            handshake_timeout_seconds: HANDSHAKE_TIMEOUT.as_secs(),
        }
    }
}

impl ConnectionConfig {
    #[must_use]
    pub const fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "pretty"
    pub file_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file_path: None,
        }
    }
}

impl Config {
    /// Load configuration from multiple sources with priority:
    /// 1. Environment variables (highest priority)
    /// 2. Config file (if provided)
    /// 3. Defaults (lowest priority)
    pub fn load(config_file: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_file {
            if Path::new(path).exists() {
                builder = builder.add_source(File::with_name(path));
            }
        }

        // DEVICECONNECT_CONNECTION__SERVER_URL, DEVICECONNECT_LOGGING__LEVEL, ...
        builder = builder.add_source(
            Environment::with_prefix("DEVICECONNECT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Load from environment variables only
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Load from file path
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        Self::load(Some(path))
    }

    /// Check the settings a connection attempt cannot do without.
    ///
    /// Collects every problem instead of stopping at the first one.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.connection.server_url.trim().is_empty() {
            errors.push("connection.server_url must be set".to_string());
        } else if let Err(e) = url::Url::parse(&self.connection.server_url) {
            errors.push(format!(
                "connection.server_url '{}' is not a valid URL: {e}",
                self.connection.server_url
            ));
        }
        if self.connection.token.is_empty() {
            errors.push("connection.token must be set".to_string());
        }
        if self.connection.handshake_timeout_seconds == 0 {
            errors.push("connection.handshake_timeout_seconds must be greater than zero".to_string());
        }
        if !matches!(self.logging.format.as_str(), "json" | "pretty") {
            errors.push(format!(
                "logging.format must be 'json' or 'pretty', got '{}'",
                self.logging.format
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
