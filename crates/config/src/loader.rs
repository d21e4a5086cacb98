//! Configuration loader implementation

use crate::schema::Config;
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Yaml},
    Figment,
};
use std::path::Path;
use types::{utils::is_valid_rpc_url, ConditionalTxError, ConfigError};

/// Prefix of environment variables that override file settings
pub const ENV_PREFIX: &str = "CONDITIONAL_TX_";

/// Configuration loader that handles YAML files and environment variables
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file and environment variables
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Config> {
        let config_path = config_path.as_ref();

        if !config_path.exists() {
            return Err(ConditionalTxError::from(ConfigError::FileNotFound {
                path: config_path.display().to_string(),
            })
            .into());
        }

        // Nested keys use a double underscore: CONDITIONAL_TX_NETWORK__RPC_URL
        let config: Config = Figment::new()
            .merge(Yaml::file(config_path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to parse configuration")?;

        Self::validate(&config)?;

        Ok(config)
    }

    /// Load configuration from string (for testing)
    pub fn load_from_str(yaml_content: &str) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Yaml::string(yaml_content))
            .extract()
            .context("Failed to parse configuration from string")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration
    fn validate(config: &Config) -> Result<()> {
        if config.network.network.is_empty() {
            return Err(ConfigError::MissingField {
                field: "network.network".to_string(),
            }
            .into());
        }

        match config.network.rpc_url.as_deref() {
            None | Some("") => {
                return Err(ConfigError::MissingField {
                    field: "network.rpc_url".to_string(),
                }
                .into());
            }
            Some(url) if !is_valid_rpc_url(url) => {
                return Err(ConfigError::ValidationError {
                    field: "network.rpc_url".to_string(),
                    message: format!("RPC URL must start with http:// or https://: {}", url),
                }
                .into());
            }
            Some(_) => {}
        }

        if config.server.port == 0 {
            return Err(ConfigError::ValidationError {
                field: "server.port".to_string(),
                message: "Server port cannot be 0".to_string(),
            }
            .into());
        }

        if config.server.max_body_size == 0 {
            return Err(ConfigError::ValidationError {
                field: "server.max_body_size".to_string(),
                message: "Max body size cannot be 0".to_string(),
            }
            .into());
        }

        if config.server.request_timeout_seconds == 0 {
            return Err(ConfigError::ValidationError {
                field: "server.request_timeout_seconds".to_string(),
                message: "Request timeout cannot be 0".to_string(),
            }
            .into());
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logging.level".to_string(),
                message: format!(
                    "Invalid log level: {}. Valid levels: {:?}",
                    config.logging.level, valid_log_levels
                ),
            }
            .into());
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logging.format".to_string(),
                message: format!(
                    "Invalid log format: {}. Valid formats: {:?}",
                    config.logging.format, valid_log_formats
                ),
            }
            .into());
        }

        if config.limits.max_known_accounts == 0 {
            return Err(ConfigError::ValidationError {
                field: "limits.max_known_accounts".to_string(),
                message: "Max known accounts cannot be 0".to_string(),
            }
            .into());
        }

        if config.limits.max_known_slots < config.limits.max_known_accounts {
            return Err(ConfigError::ValidationError {
                field: "limits.max_known_slots".to_string(),
                message: "Max known slots cannot be lower than max known accounts".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Get default configuration
    pub fn default() -> Config {
        Config::default()
    }

    /// Create example configuration file
    pub fn create_example<P: AsRef<Path>>(path: P) -> Result<()> {
        let config = Self::default();
        let yaml_content = serde_yaml::to_string(&config)
            .context("Failed to serialize default configuration")?;

        std::fs::write(path.as_ref(), yaml_content)
            .context("Failed to write example configuration file")?;

        Ok(())
    }
}
