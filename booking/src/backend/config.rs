//! Runtime configuration.
//!
//! Defaults cover local development. A YAML file named by `TUTEASY_CONFIG`
//! can override any of them, and `TUTEASY_BIND_ADDR` / `TUTEASY_API_BASE_URL`
//! override the file.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::backend::domain::booking_draft::DEFAULT_LESSON_MINUTES;

pub const CONFIG_PATH_ENV: &str = "TUTEASY_CONFIG";
pub const BIND_ADDR_ENV: &str = "TUTEASY_BIND_ADDR";
pub const API_BASE_URL_ENV: &str = "TUTEASY_API_BASE_URL";

const MIN_LESSON_MINUTES: u32 = 15;
const MAX_LESSON_MINUTES: u32 = 240;
const LESSON_STEP_MINUTES: u32 = 15;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    /// Origin allowed by CORS, normally the web frontend
    pub allowed_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".to_string(),
            allowed_origin: "http://localhost:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000".to_string(),
            request_timeout_secs: 10,
        }
    }
}

impl ClientConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingConfig {
    /// Length of every lesson booked through the flow
    pub default_duration_minutes: u32,
    /// How many days ahead a lesson may be booked; unlimited when absent
    pub booking_window_days: Option<u32>,
    pub server: ServerConfig,
    pub client: ClientConfig,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            default_duration_minutes: DEFAULT_LESSON_MINUTES,
            booking_window_days: None,
            server: ServerConfig::default(),
            client: ClientConfig::default(),
        }
    }
}

impl BookingConfig {
    /// Load from `TUTEASY_CONFIG` if set, then apply environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let shown = path.display().to_string();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: shown.clone(),
            source,
        })?;
        let config: Self = serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: shown.clone(),
            source,
        })?;
        info!("Loaded configuration from {}", shown);
        Ok(config)
    }

    /// Override fields from environment-style variables looked up through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup(BIND_ADDR_ENV) {
            self.server.bind_address = addr;
        }
        if let Some(url) = lookup(API_BASE_URL_ENV) {
            self.client.api_base_url = url;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let duration = self.default_duration_minutes;
        if !(MIN_LESSON_MINUTES..=MAX_LESSON_MINUTES).contains(&duration) || duration % LESSON_STEP_MINUTES != 0 {
            return Err(ConfigError::Invalid(format!(
                "default_duration_minutes must be a multiple of {} between {} and {}, got {}",
                LESSON_STEP_MINUTES, MIN_LESSON_MINUTES, MAX_LESSON_MINUTES, duration
            )));
        }
        if self.client.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("client.request_timeout_secs must be positive".to_string()));
        }
        self.bind_address()?;
        Ok(())
    }

    pub fn bind_address(&self) -> Result<SocketAddr, ConfigError> {
        self.server
            .bind_address
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("bad server.bind_address '{}'", self.server.bind_address)))
    }
}
