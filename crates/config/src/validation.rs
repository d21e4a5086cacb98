//! Configuration validation utilities

use crate::schema::Config;
use types::utils::is_valid_rpc_url;
use types::Result;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate complete configuration
    pub fn validate(config: &Config) -> Result<ValidationReport> {
        let mut report = ValidationReport::new();

        Self::validate_network(config, &mut report);
        Self::validate_server(config, &mut report);
        Self::validate_logging(config, &mut report);
        Self::validate_limits(config, &mut report);

        Ok(report)
    }

    fn validate_network(config: &Config, report: &mut ValidationReport) {
        if config.network.network.is_empty() {
            report.add_error("network.network", "Network name cannot be empty");
        }

        let valid_networks = ["mainnet", "sepolia", "holesky", "devnet"];
        if !valid_networks.contains(&config.network.network.as_str()) {
            report.add_warning(
                "network.network",
                &format!("Unknown network '{}'. Supported networks: {:?}", config.network.network, valid_networks)
            );
        }

        if let Some(chain_id) = config.network.chain_id {
            match config.network.network.as_str() {
                "mainnet" if chain_id != 1 => {
                    report.add_warning("network.chain_id", "Chain ID 1 expected for mainnet");
                }
                "sepolia" if chain_id != 11155111 => {
                    report.add_warning("network.chain_id", "Chain ID 11155111 expected for sepolia");
                }
                "holesky" if chain_id != 17000 => {
                    report.add_warning("network.chain_id", "Chain ID 17000 expected for holesky");
                }
                _ => {}
            }
        }

        match config.network.rpc_url {
            None => report.add_error("network.rpc_url", "An RPC URL is required to read account storage"),
            Some(ref rpc_url) if !is_valid_rpc_url(rpc_url) => {
                report.add_error("network.rpc_url", "RPC URL must start with http:// or https://");
            }
            Some(ref rpc_url) if rpc_url.starts_with("http://") && !rpc_url.contains("localhost") && !rpc_url.contains("127.0.0.1") => {
                report.add_warning("network.rpc_url", "Remote RPC URL should use HTTPS");
            }
            Some(_) => {}
        }
    }

    fn validate_server(config: &Config, report: &mut ValidationReport) {
        if config.server.port == 0 {
            report.add_error("server.port", "Server port cannot be 0");
        } else if config.server.port < 1024 {
            report.add_warning("server.port", "Server port is below 1024, may require elevated privileges");
        }

        if config.server.request_timeout_seconds == 0 {
            report.add_error("server.request_timeout_seconds", "Request timeout cannot be 0");
        } else if config.server.request_timeout_seconds > 300 {
            report.add_warning("server.request_timeout_seconds", "Request timeout is very high");
        }

        if config.server.max_body_size == 0 {
            report.add_error("server.max_body_size", "Max body size cannot be 0");
        } else if config.server.max_body_size > 10 * 1024 * 1024 {
            report.add_warning("server.max_body_size", "Max body size is greater than 10MB");
        }

        if config.server.host.is_empty() {
            report.add_error("server.host", "Server host cannot be empty");
        }
    }

    fn validate_logging(config: &Config, report: &mut ValidationReport) {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&config.logging.level.as_str()) {
            report.add_error("logging.level", &format!("Invalid log level: {}. Valid levels: {:?}", config.logging.level, valid_levels));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&config.logging.format.as_str()) {
            report.add_error("logging.format", &format!("Invalid log format: {}. Valid formats: {:?}", config.logging.format, valid_formats));
        }

        if config.logging.level == "trace" || config.logging.level == "debug" {
            report.add_warning("logging.level", "Debug/trace logging may impact performance in production");
        }
    }

    fn validate_limits(config: &Config, report: &mut ValidationReport) {
        let limits = &config.limits;

        if limits.max_known_accounts == 0 {
            report.add_error("limits.max_known_accounts", "Max known accounts cannot be 0");
        }

        if limits.max_known_slots == 0 {
            report.add_error("limits.max_known_slots", "Max known slots cannot be 0");
        } else if limits.max_known_slots < limits.max_known_accounts {
            report.add_error("limits", "Max known slots cannot be lower than max known accounts");
        }

        // Every slot costs one eth_getStorageAt round trip
        if limits.max_known_slots > 10_000 {
            report.add_warning("limits.max_known_slots", "Max known slots is very high, validation may hit the request timeout");
        }
    }
}

/// Validation report containing errors and warnings
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

/// A validation issue (error or warning)
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, field: &str, message: &str) {
        self.errors.push(ValidationIssue {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn add_warning(&mut self, field: &str, message: &str) {
        self.warnings.push(ValidationIssue {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn is_valid(&self) -> bool {
        !self.has_errors()
    }

    pub fn summary(&self) -> String {
        format!("Validation: {} errors, {} warnings", self.errors.len(), self.warnings.len())
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}
