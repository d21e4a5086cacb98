//! Conditional transaction gateway - main application entry point

use anyhow::{Context, Result};
use config::{Config, ConfigLoader, ConfigValidator, LoggingConfig, ValidationReport};
use std::env;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod app;

use app::Application;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before reading CONFIG_PATH and the CONDITIONAL_TX_ overrides
    let dotenv_result = dotenv::dotenv();

    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());
    let config = ConfigLoader::load(&config_path)
        .context("Failed to load configuration")?;

    init_logging(&config.logging)?;
    report_config_issues(&config)?;

    match dotenv_result {
        Ok(path) => info!("Loaded environment variables from {}", path.display()),
        Err(e) if !e.not_found() => warn!("Could not load .env file: {}", e),
        Err(_) => {}
    }

    info!("Starting conditional transaction gateway v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded from: {}", config_path);
    info!("Network: {}", config.network.network);
    info!(
        max_known_accounts = config.limits.max_known_accounts,
        max_known_slots = config.limits.max_known_slots,
        "Known account limits"
    );

    let mut app = Application::new(config)
        .context("Failed to create application")?;

    let shutdown_signal = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(e) => warn!("Failed to listen for shutdown signal: {}", e),
        }
    };

    info!("Application starting...");
    tokio::select! {
        result = app.run() => {
            if let Err(e) = result {
                tracing::error!("Application error: {}", e);
                return Err(e);
            }
        }
        _ = shutdown_signal => {
            info!("Initiating graceful shutdown...");
            app.shutdown().await?;
        }
    }

    info!("Gateway shutdown complete");
    Ok(())
}

/// Log configuration warnings and refuse to start on errors
fn report_config_issues(config: &Config) -> Result<ValidationReport> {
    let report = ConfigValidator::validate(config).context("Failed to validate configuration")?;

    for warning in &report.warnings {
        warn!(field = %warning.field, "{}", warning.message);
    }
    for error in &report.errors {
        tracing::error!(field = %error.field, "{}", error.message);
    }

    if report.has_errors() {
        anyhow::bail!("Invalid configuration: {}", report.summary());
    }

    info!("{}", report.summary());
    Ok(report)
}

/// Initialize logging from configuration.
///
/// `RUST_LOG` and `LOG_FORMAT` take precedence over the configured values.
fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let log_level = env::var("RUST_LOG").unwrap_or_else(|_| logging.level.clone());
    let log_format = env::var("LOG_FORMAT").unwrap_or_else(|_| logging.format.clone());

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    match log_format.as_str() {
        "pretty" => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()
                .context("Failed to initialize pretty logging")?;
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()
                .context("Failed to initialize JSON logging")?;
        }
    }

    info!("Logging initialized");
    info!("Log level: {}", log_level);
    info!("Log format: {}", log_format);

    if log_level == "trace" || log_level == "debug" {
        warn!("Debug/trace logging enabled - may impact performance in production");
    }

    Ok(())
}
