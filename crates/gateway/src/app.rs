//! Main application structure and lifecycle management

use crate::api::ApiServer;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use config::Config;
use std::sync::Arc;
use tracing::info;
use validator::{ConditionalValidator, RpcStateSource, StateSource};

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub validator: ConditionalValidator<Arc<dyn StateSource>>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Create state over an arbitrary state source
    pub fn new(config: Config, source: Arc<dyn StateSource>) -> Self {
        Self {
            config,
            validator: ConditionalValidator::new(source),
            started_at: Utc::now(),
        }
    }

    /// The state source backing the validator
    pub fn source(&self) -> &dyn StateSource {
        self.validator.source().as_ref()
    }

    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("network", &self.config.network.network)
            .field("source", &self.source().name())
            .field("started_at", &self.started_at)
            .finish()
    }
}

/// Main application that coordinates all components
pub struct Application {
    state: Arc<AppState>,
    api_server: ApiServer,
}

impl Application {
    /// Create a new application instance
    pub fn new(config: Config) -> Result<Self> {
        info!("Initializing application components...");

        let rpc_url = config
            .network
            .rpc_url
            .clone()
            .ok_or_else(|| anyhow!("network.rpc_url is required"))?;
        let source: Arc<dyn StateSource> = Arc::new(RpcStateSource::new(rpc_url));

        let state = Arc::new(AppState::new(config, source));

        let api_server = ApiServer::new(state.clone())
            .context("Failed to create API server")?;

        info!("Application components initialized successfully");

        Ok(Self { state, api_server })
    }

    /// Run the application
    pub async fn run(&mut self) -> Result<()> {
        if !self.state.source().is_available().await {
            tracing::warn!(
                source = self.state.source().name(),
                "State source is not reachable, validation requests will fail until it is"
            );
        }

        info!("Starting API server on {}:{}",
            self.state.config.server.host,
            self.state.config.server.port
        );

        self.api_server.run().await.context("API server error")
    }

    /// Shutdown the application gracefully
    pub async fn shutdown(&mut self) -> Result<()> {
        info!("Shutting down application...");

        self.api_server.shutdown().await
            .context("Failed to shutdown API server")?;
        info!("API server shutdown complete");

        info!(uptime_seconds = self.state.uptime_seconds(), "Application shutdown complete");
        Ok(())
    }

    /// Get application state
    pub fn state(&self) -> Arc<AppState> {
        self.state.clone()
    }
}
