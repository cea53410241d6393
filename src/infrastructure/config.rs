use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid similarity threshold: {0}. Must be strictly between 0 and 1")]
    InvalidThreshold(f32),

    #[error("Invalid candidate limit: {0}. Must be at least 1")]
    InvalidCandidateLimit(usize),

    #[error("Model fallback chain cannot be empty")]
    EmptyModelChain,

    #[error("Invalid repository name: {0}. Expected owner/repo")]
    InvalidRepoName(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .echofinder/config.yaml (project config)
    /// 3. .echofinder/local.yaml (local overrides, optional)
    /// 4. Environment variables (`ECHOFINDER_*` prefix, highest priority)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".echofinder/config.yaml"))
            .merge(Yaml::file(".echofinder/local.yaml"))
            .merge(Env::prefixed("ECHOFINDER_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }
        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(
                config.database.max_connections,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let threshold = config.matcher.similarity_threshold;
        if !(threshold > 0.0 && threshold < 1.0) {
            return Err(ConfigError::InvalidThreshold(threshold));
        }
        if config.matcher.candidate_limit == 0 {
            return Err(ConfigError::InvalidCandidateLimit(
                config.matcher.candidate_limit,
            ));
        }

        if config.synthesis.models.is_empty() {
            return Err(ConfigError::EmptyModelChain);
        }

        for repo in &config.tracker.repos {
            let valid = repo
                .split_once('/')
                .is_some_and(|(owner, name)| !owner.is_empty() && !name.is_empty());
            if !valid {
                return Err(ConfigError::InvalidRepoName(repo.clone()));
            }
        }

        Ok(())
    }
}
