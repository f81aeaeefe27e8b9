use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::Path;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Project config directory, relative to the working directory.
pub const CONFIG_DIR: &str = ".faqbot";

/// Prefix for environment overrides; `__` separates nested keys.
pub const ENV_PREFIX: &str = "FAQBOT_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Collection name cannot be empty")]
    EmptyCollection,

    #[error("Invalid batch_size: {0}. Must be at least 1")]
    InvalidBatchSize(usize),

    #[error("Invalid k: {0}. Must be at least 1")]
    InvalidK(usize),

    #[error("Invalid threshold: {0}. Must be between 0.0 and 1.0")]
    InvalidThreshold(f32),

    #[error("Invalid temperature: {0}. Must be between 0.0 and 2.0")]
    InvalidTemperature(f32),

    #[error("Invalid requests_per_second: 0. Must be positive or unset")]
    InvalidRateLimit,

    #[error(
        "Invalid backoff configuration: initial_backoff_ms ({0}) must be less than max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .faqbot/config.yaml
    /// 3. .faqbot/local.yaml (optional local overrides)
    /// 4. Environment variables (FAQBOT_* prefix)
    pub fn load() -> Result<Config> {
        let dir = Path::new(CONFIG_DIR);
        Self::load_layers(&[dir.join("config.yaml"), dir.join("local.yaml")])
    }

    /// Load configuration from a specific file, still honouring env overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        Self::load_layers(&[path])
            .with_context(|| format!("Failed to load config from {}", path.display()))
    }

    fn load_layers<P: AsRef<Path>>(files: &[P]) -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        for file in files {
            figment = figment.merge(Yaml::file(file.as_ref()));
        }

        let config: Config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let openai = &config.openai;
        if openai.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "openai.base_url cannot be empty".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&openai.temperature) {
            return Err(ConfigError::InvalidTemperature(openai.temperature));
        }

        if openai.max_tokens == 0 || openai.embedding_dimension == 0 || openai.timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "openai.max_tokens, embedding_dimension and timeout_secs must be positive"
                    .to_string(),
            ));
        }

        if openai.requests_per_second == Some(0) {
            return Err(ConfigError::InvalidRateLimit);
        }

        if openai.max_retries > 0 && openai.initial_backoff_ms >= openai.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                openai.initial_backoff_ms,
                openai.max_backoff_ms,
            ));
        }

        // Store
        if config.store.database_path.trim().is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }

        if config.store.collection.trim().is_empty() {
            return Err(ConfigError::EmptyCollection);
        }

        if config.store.progress_file.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "store.progress_file cannot be empty".to_string(),
            ));
        }

        // Ingestion
        if config.ingestion.batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize(0));
        }

        config
            .ingestion
            .chunking
            .validate()
            .map_err(ConfigError::ValidationFailed)?;

        // Retrieval
        if config.retrieval.k == 0 {
            return Err(ConfigError::InvalidK(0));
        }

        if !(0.0..=1.0).contains(&config.retrieval.threshold) {
            return Err(ConfigError::InvalidThreshold(config.retrieval.threshold));
        }

        // Conversation and chain
        if config.conversation.max_history_tokens == 0 {
            return Err(ConfigError::ValidationFailed(
                "conversation.max_history_tokens must be positive".to_string(),
            ));
        }

        if config.chain.top_k == 0 {
            return Err(ConfigError::InvalidK(0));
        }

        if config.chain.out_of_domain_message.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "chain.out_of_domain_message cannot be empty".to_string(),
            ));
        }

        // Logging
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(config.logging.rotation.clone()));
        }

        Ok(())
    }
}
