//! Configuration module for wtrk-server.
//!
//! Handles loading configuration from TOML files, CLI arguments,
//! and environment variables.

pub mod file;

use crate::config::file::{ContentConfig, FileConfig, NotificationConfig, RedisConfig};
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;
use wtrk_core::config::PipelineConfig;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("DATABASE_URL environment variable not set")]
    MissingDatabaseUrl,
}

/// Server section after CLI overrides.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
}

/// Loaded configuration result containing all parts.
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub redis: RedisConfig,
    pub content: ContentConfig,
    pub notification: NotificationConfig,
    pub pipeline: PipelineConfig,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: std::path::PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Read, override, and validate the configuration file.
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        self.load_str(&config_content)
    }

    /// Reload the configuration (used during SIGHUP).
    ///
    /// Only the pipeline section is applied by the caller; the rest is
    /// validated so a broken file is reported early.
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }

    fn load_str(&self, config_content: &str) -> Result<LoadedConfig, ConfigError> {
        let mut file_config: FileConfig = toml::from_str(config_content)?;

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        validate(&file_config)?;

        Ok(build_loaded_config(file_config))
    }
}

fn validate(config: &FileConfig) -> Result<(), ConfigError> {
    if config.redis.url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "redis.url must not be empty".to_string(),
        ));
    }
    if config.redis.key_pattern.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "redis.key_pattern must not be empty".to_string(),
        ));
    }
    if !matches!(config.content.gateway_url.scheme(), "http" | "https") {
        return Err(ConfigError::ValidationError(format!(
            "content.gateway_url must be http or https, got {}",
            config.content.gateway_url.scheme()
        )));
    }
    match &config.notification {
        NotificationConfig::Http { endpoint, .. } => {
            if !matches!(endpoint.scheme(), "http" | "https") {
                return Err(ConfigError::ValidationError(format!(
                    "notification.endpoint must be http or https, got {}",
                    endpoint.scheme()
                )));
            }
        }
        NotificationConfig::Amqp { url, queue } => {
            if url.trim().is_empty() || queue.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "notification.url and notification.queue are required for amqp".to_string(),
                ));
            }
        }
    }
    if config.pipeline.item_concurrency == 0 {
        return Err(ConfigError::ValidationError(
            "pipeline.item_concurrency must be at least 1".to_string(),
        ));
    }
    if config
        .pipeline
        .recipient_override
        .as_deref()
        .is_some_and(|recipient| recipient.trim().is_empty())
    {
        return Err(ConfigError::ValidationError(
            "pipeline.recipient_override must not be empty when set".to_string(),
        ));
    }
    Ok(())
}

fn build_loaded_config(file_config: FileConfig) -> LoadedConfig {
    LoadedConfig {
        server: ServerConfig {
            listen: file_config.server.listen,
        },
        redis: file_config.redis,
        content: file_config.content,
        notification: file_config.notification,
        pipeline: PipelineConfig {
            dedup: file_config.pipeline.dedup,
            item_concurrency: file_config.pipeline.item_concurrency,
            recipient_override: file_config.pipeline.recipient_override,
        },
    }
}

/// Get the database URL from the environment.
pub fn get_database_url() -> Result<String, ConfigError> {
    std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)
}
