// src/config.rs

//! Application configuration structures.
//!
//! Settings load from an optional TOML file, then broker settings are
//! overridden by the `RABBITMQ_*` environment variables.

use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Broker connection settings
    #[serde(default)]
    pub broker: BrokerConfig,

    /// HTTP fetch behavior settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Long-running worker settings
    #[serde(default)]
    pub worker: WorkerConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Override broker settings from `RABBITMQ_*` environment variables.
    ///
    /// Unset variables leave the current value in place. A non-numeric
    /// `RABBITMQ_PORT` is rejected rather than silently ignored.
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(host) = env::var("RABBITMQ_HOST") {
            self.broker.host = host;
        }
        if let Ok(port) = env::var("RABBITMQ_PORT") {
            self.broker.port = port
                .parse()
                .map_err(|_| AppError::config(format!("Invalid RABBITMQ_PORT: {port}")))?;
        }
        if let Ok(user) = env::var("RABBITMQ_USER") {
            self.broker.username = user;
        }
        if let Ok(password) = env::var("RABBITMQ_PASSWORD") {
            self.broker.password = password;
        }
        if let Ok(queue) = env::var("RABBITMQ_QUEUE") {
            self.broker.queue = queue;
        }
        Ok(())
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.broker.host.trim().is_empty() {
            return Err(AppError::config("broker.host is empty"));
        }
        if self.broker.queue.trim().is_empty() {
            return Err(AppError::config("broker.queue is empty"));
        }
        if self.fetch.user_agent.trim().is_empty() {
            return Err(AppError::config("fetch.user_agent is empty"));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(AppError::config("fetch.timeout_secs must be > 0"));
        }
        if self.worker.reconnect_initial_secs == 0 {
            return Err(AppError::config("worker.reconnect_initial_secs must be > 0"));
        }
        if self.worker.reconnect_max_secs < self.worker.reconnect_initial_secs {
            return Err(AppError::config(
                "worker.reconnect_max_secs must be >= worker.reconnect_initial_secs",
            ));
        }
        Ok(())
    }
}

/// Broker connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Broker hostname
    #[serde(default = "defaults::host")]
    pub host: String,

    /// Broker port
    #[serde(default = "defaults::port")]
    pub port: u16,

    /// Broker username
    #[serde(default = "defaults::username")]
    pub username: String,

    /// Broker password
    #[serde(default = "defaults::password")]
    pub password: String,

    /// Queue name for URL messages
    #[serde(default = "defaults::queue")]
    pub queue: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: defaults::host(),
            port: defaults::port(),
            username: defaults::username(),
            password: defaults::password(),
            queue: defaults::queue(),
        }
    }
}

/// HTTP fetch behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Maximum redirects to follow per request
    #[serde(default = "defaults::max_redirects")]
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_redirects: defaults::max_redirects(),
        }
    }
}

/// Long-running worker settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Initial broker reconnect delay in seconds
    #[serde(default = "defaults::reconnect_initial")]
    pub reconnect_initial_secs: u64,

    /// Maximum broker reconnect delay in seconds
    #[serde(default = "defaults::reconnect_max")]
    pub reconnect_max_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            reconnect_initial_secs: defaults::reconnect_initial(),
            reconnect_max_secs: defaults::reconnect_max(),
        }
    }
}

mod defaults {
    pub fn host() -> String {
        "localhost".to_string()
    }

    pub fn port() -> u16 {
        5672
    }

    pub fn username() -> String {
        "guest".to_string()
    }

    pub fn password() -> String {
        "guest".to_string()
    }

    pub fn queue() -> String {
        "urls".to_string()
    }

    pub fn user_agent() -> String {
        concat!("crawlq/", env!("CARGO_PKG_VERSION")).to_string()
    }

    pub fn timeout() -> u64 {
        30
    }

    pub fn max_redirects() -> usize {
        10
    }

    pub fn reconnect_initial() -> u64 {
        1
    }

    pub fn reconnect_max() -> u64 {
        60
    }
}
