//! Configuration schema definitions

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Ethereum network configuration
    pub network: NetworkConfig,
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Request limits
    #[serde(default)]
    pub limits: LimitsConfig,
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Network name (mainnet, sepolia, holesky)
    pub network: String,
    /// Ethereum RPC URL used to read account storage
    pub rpc_url: Option<String>,
    /// Chain ID
    pub chain_id: Option<u64>,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Maximum request body size in bytes
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Limits on the known accounts a single request may declare
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum number of accounts
    #[serde(default = "default_max_known_accounts")]
    pub max_known_accounts: usize,
    /// Maximum number of state reads (one per root, one per slot)
    #[serde(default = "default_max_known_slots")]
    pub max_known_slots: usize,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_body_size() -> usize {
    1024 * 1024 // 1MB
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_max_known_accounts() -> usize {
    100
}

fn default_max_known_slots() -> usize {
    1000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: NetworkConfig {
                network: "mainnet".to_string(),
                rpc_url: Some("http://localhost:8545".to_string()),
                chain_id: Some(1),
            },
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            limits: LimitsConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
            max_body_size: default_max_body_size(),
            cors_enabled: default_true(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_known_accounts: default_max_known_accounts(),
            max_known_slots: default_max_known_slots(),
        }
    }
}
