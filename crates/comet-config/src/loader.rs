//! Configuration loading utilities

use crate::{schema::Config, validator::ConfigValidator};
use std::{
    env,
    path::{Path, PathBuf},
    str::FromStr,
};
use thiserror::Error;
use tracing::{debug, info};

/// Environment variable naming the configuration file
pub const CONFIG_PATH_VAR: &str = "COMET_CONFIG_PATH";

/// Files probed, in order, when `COMET_CONFIG_PATH` is unset
pub const DEFAULT_CONFIG_FILES: [&str; 3] = ["config.yaml", "config.yml", "config.toml"];

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error when reading configuration file
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("Failed to parse TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// The file extension is neither YAML nor TOML
    #[error("Unsupported configuration format: {0}")]
    UnsupportedFormat(PathBuf),

    /// Configuration validation error
    #[error("Configuration validation failed: {0}")]
    Validation(String),

    /// Environment variable parsing error
    #[error("Failed to parse environment variable '{var}': {source}")]
    EnvParse {
        /// Variable name
        var: String,
        /// Parse error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl From<ConfigError> for comet_common::CometError {
    fn from(err: ConfigError) -> Self {
        comet_common::CometError::config_with_source("Failed to load configuration", err)
    }
}

/// Configuration loader for the application
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from the environment-selected file, a default file
    /// in the working directory, or built-in defaults, then apply `COMET_*`
    /// overrides and validate.
    pub fn load() -> Result<Config, ConfigError> {
        if let Ok(path) = env::var(CONFIG_PATH_VAR) {
            return Self::load_from_file(path);
        }

        if let Some(path) = DEFAULT_CONFIG_FILES
            .iter()
            .map(Path::new)
            .find(|path| path.exists())
        {
            return Self::load_from_file(path);
        }

        info!("No configuration file found, using defaults");
        let mut config = Config::default();
        Self::apply_env_overrides(&mut config)?;
        ConfigValidator::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific YAML or TOML file with environment overrides
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        let mut config = Self::parse_file(path)?;
        Self::apply_env_overrides(&mut config)?;
        ConfigValidator::validate(&config)?;

        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parse a file by extension without overrides or validation
    pub fn parse_file(path: &Path) -> Result<Config, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => Ok(serde_yaml::from_str(&content)?),
            Some("toml") => Ok(toml::from_str(&content)?),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    /// Apply `COMET_*` environment variable overrides to configuration
    pub fn apply_env_overrides(config: &mut Config) -> Result<(), ConfigError> {
        Self::apply_overrides(config, |var| env::var(var).ok())
    }

    /// Apply overrides read through `lookup`
    pub fn apply_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(owner) = parse_var(&lookup, "COMET_OWNER_ID")? {
            config.bot.owner_id = owner;
        }

        if let Some(token) = lookup("COMET_TWITTER_TOKEN") {
            config.twitter.consumer_key = token;
        }

        if let Some(secret) = lookup("COMET_TWITTER_SECRET") {
            config.twitter.consumer_secret = secret;
        }

        if let Some(proxy) = lookup("COMET_PROXY_URL") {
            config.twitter.proxy_url = Some(proxy).filter(|p| !p.is_empty());
        }

        if let Some(port) = parse_var(&lookup, "COMET_PROXY_PORT")? {
            config.twitter.proxy_port = port;
        }

        if let Some(level) = lookup("COMET_LOG_LEVEL") {
            config.logging.level = level;
        }

        debug!("Applied environment overrides");
        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, var: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(var)
        .map(|value| {
            value.trim().parse().map_err(|e| ConfigError::EnvParse {
                var: var.to_string(),
                source: Box::new(e),
            })
        })
        .transpose()
}
