//! Main application configuration
//!
//! This module defines the primary configuration structures for the lobby
//! client, including environment variable loading, TOML files and validation.

use crate::config::lobby::TableLimits;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub server: ServerSettings,
    pub session: SessionSettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Client name for logging
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

/// Game server endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Base URL of the REST API
    pub api_url: String,
    /// Versioned path prefix appended to every REST call
    pub api_prefix: String,
    /// URL of the realtime event endpoint
    pub socket_url: String,
    /// Timeout for a single REST request in seconds
    pub request_timeout_seconds: u64,
    /// How long to wait for an event acknowledgement before giving up
    pub ack_timeout_seconds: u64,
    /// Reconnect the event transport after it drops
    pub reconnect: bool,
    /// Maximum reconnection attempts before giving up
    pub max_reconnect_attempts: u32,
    /// Initial reconnection delay in milliseconds
    pub reconnect_delay_ms: u64,
}

/// Session-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// File used to keep credentials between CLI invocations; in-memory when unset
    pub credentials_file: Option<PathBuf>,
    /// Limits applied to new tables before they reach the server
    pub tables: TableLimits,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "seka-lobby".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3000".to_string(),
            api_prefix: "/api/v1".to_string(),
            socket_url: "ws://localhost:3000/ws".to_string(),
            request_timeout_seconds: 15,
            ack_timeout_seconds: 5,
            reconnect: true,
            max_reconnect_attempts: 5,
            reconnect_delay_ms: 1000,
        }
    }
}

impl ServerSettings {
    /// Get REST request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Get initial reconnection delay as Duration
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            credentials_file: None,
            tables: TableLimits::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: AppConfig = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }

        // Server settings
        if let Ok(url) = env::var("LOBBY_API_URL") {
            self.server.api_url = url;
        }
        if let Ok(prefix) = env::var("LOBBY_API_PREFIX") {
            self.server.api_prefix = prefix;
        }
        if let Ok(url) = env::var("LOBBY_SOCKET_URL") {
            self.server.socket_url = url;
        }
        if let Ok(timeout) = env::var("LOBBY_REQUEST_TIMEOUT_SECONDS") {
            self.server.request_timeout_seconds = timeout
                .parse()
                .map_err(|_| anyhow!("Invalid LOBBY_REQUEST_TIMEOUT_SECONDS value: {}", timeout))?;
        }
        if let Ok(timeout) = env::var("LOBBY_ACK_TIMEOUT_SECONDS") {
            self.server.ack_timeout_seconds = timeout
                .parse()
                .map_err(|_| anyhow!("Invalid LOBBY_ACK_TIMEOUT_SECONDS value: {}", timeout))?;
        }
        if let Ok(reconnect) = env::var("LOBBY_RECONNECT") {
            self.server.reconnect = reconnect
                .parse()
                .map_err(|_| anyhow!("Invalid LOBBY_RECONNECT value: {}", reconnect))?;
        }
        if let Ok(attempts) = env::var("LOBBY_MAX_RECONNECT_ATTEMPTS") {
            self.server.max_reconnect_attempts = attempts
                .parse()
                .map_err(|_| anyhow!("Invalid LOBBY_MAX_RECONNECT_ATTEMPTS value: {}", attempts))?;
        }
        if let Ok(delay) = env::var("LOBBY_RECONNECT_DELAY_MS") {
            self.server.reconnect_delay_ms = delay
                .parse()
                .map_err(|_| anyhow!("Invalid LOBBY_RECONNECT_DELAY_MS value: {}", delay))?;
        }

        // Session settings
        if let Ok(path) = env::var("LOBBY_CREDENTIALS_FILE") {
            self.session.credentials_file = Some(PathBuf::from(path));
        }
        if let Ok(min) = env::var("LOBBY_MIN_PLAYERS") {
            self.session.tables.min_players = min
                .parse()
                .map_err(|_| anyhow!("Invalid LOBBY_MIN_PLAYERS value: {}", min))?;
        }
        if let Ok(max) = env::var("LOBBY_MAX_PLAYERS") {
            self.session.tables.max_players = max
                .parse()
                .map_err(|_| anyhow!("Invalid LOBBY_MAX_PLAYERS value: {}", max))?;
        }

        Ok(())
    }

    /// Get acknowledgement timeout as Duration
    pub fn ack_timeout(&self) -> Duration {
        Duration::from_secs(self.server.ack_timeout_seconds)
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    // Validate endpoints
    if config.server.api_url.is_empty() {
        return Err(anyhow!("API URL cannot be empty"));
    }
    url::Url::parse(&config.server.api_url)
        .map_err(|e| anyhow!("Invalid API URL {}: {}", config.server.api_url, e))?;
    if !config.server.api_prefix.is_empty() && !config.server.api_prefix.starts_with('/') {
        return Err(anyhow!("API prefix must start with '/'"));
    }
    if config.server.socket_url.is_empty() {
        return Err(anyhow!("Socket URL cannot be empty"));
    }

    // Validate timeouts
    if config.server.request_timeout_seconds == 0 {
        return Err(anyhow!("Request timeout must be greater than 0"));
    }
    if config.server.ack_timeout_seconds == 0 {
        return Err(anyhow!("Ack timeout must be greater than 0"));
    }

    config.session.tables.validate()?;

    Ok(())
}
