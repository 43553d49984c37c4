//! Configuration module for channel-stats-gateway
//!
//! Supports configuration via file and environment variables. The two values
//! the gateway cannot run without, the API key and the channel id, are
//! checked by [`AppConfig::credentials`] before anything is bound.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the YouTube Data API key
pub const API_KEY_ENV: &str = "YOUTUBE_API_KEY";
/// Environment variable holding the channel to report on
pub const CHANNEL_ID_ENV: &str = "YOUTUBE_CHANNEL_ID";

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind the server to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// How long in-flight requests may run after a shutdown signal
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_shutdown_timeout_secs() -> u64 {
    60
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

/// Upstream API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YoutubeConfig {
    /// API key sent with every upstream call
    #[serde(default)]
    pub api_key: Option<String>,
    /// Channel the endpoint reports on
    #[serde(default)]
    pub channel_id: Option<String>,
    /// Base URL of the Data API
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    crate::youtube::DEFAULT_BASE_URL.to_string()
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            channel_id: None,
            base_url: default_base_url(),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Upstream configuration
    #[serde(default)]
    pub youtube: YoutubeConfig,
}

/// Validated values required to serve requests
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub channel_id: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("channel_id", &self.channel_id)
            .finish()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load() -> anyhow::Result<Self> {
        let mut config = config::Config::builder();

        config = config.add_source(config::Config::try_from(&AppConfig::default())?);

        if std::path::Path::new("config.toml").exists() {
            config = config.add_source(config::File::with_name("config").required(false));
        }

        // Override with environment variables, e.g. STATS_GATEWAY__SERVER__PORT
        config = config.add_source(
            config::Environment::with_prefix("STATS_GATEWAY")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = config.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        Ok(app_config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig =
            toml::from_str(&contents).or_else(|_| serde_json::from_str(&contents))?;
        Ok(config)
    }

    /// Resolve the API key and channel id, rejecting absent or blank values
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        let api_key = non_blank(self.youtube.api_key.as_deref())
            .ok_or(ConfigError::Missing(API_KEY_ENV))?;
        let channel_id = non_blank(self.youtube.channel_id.as_deref())
            .ok_or(ConfigError::Missing(CHANNEL_ID_ENV))?;

        Ok(Credentials {
            api_key,
            channel_id,
        })
    }

    /// Copy of the configuration that is safe to print
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.youtube.api_key.is_some() {
            config.youtube.api_key = Some("<redacted>".to_string());
        }
        config
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
