//! HTTP API server implementation

use crate::api::routes;
use crate::app::AppState;
use anyhow::{Context, Result};
use axum::{http::Method, Router};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};

/// HTTP API server
pub struct ApiServer {
    app: Router,
    addr: SocketAddr,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(state: Arc<AppState>) -> Result<Self> {
        let addr: SocketAddr = format!("{}:{}", state.config.server.host, state.config.server.port)
            .parse()
            .context("Invalid server host/port configuration")?;

        let app = build_router(state);

        info!("API server configured for {}", addr);

        Ok(Self { app, addr })
    }

    /// Run the API server
    pub async fn run(&mut self) -> Result<()> {
        let listener = TcpListener::bind(self.addr)
            .await
            .context("Failed to bind to server address")?;

        info!("API server listening on {}", self.addr);

        axum::serve(listener, self.app.clone())
            .await
            .context("API server error")?;

        Ok(())
    }

    /// Shutdown the API server
    pub async fn shutdown(&mut self) -> Result<()> {
        // The serve future is dropped by the caller's select
        info!("API server shutdown initiated");
        Ok(())
    }
}

/// Build the router with all middleware layers applied
pub fn build_router(state: Arc<AppState>) -> Router {
    let server = &state.config.server;

    let cors = if server.cors_enabled {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    Router::new()
        .merge(routes::create_routes())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO))
        )
        .layer(TimeoutLayer::new(Duration::from_secs(server.request_timeout_seconds)))
        .layer(RequestBodyLimitLayer::new(server.max_body_size))
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use config::Config;
    use tower::util::ServiceExt;
    use validator::{StateSnapshot, StaticStateSource};

    fn state_with(config: Config) -> Arc<AppState> {
        Arc::new(AppState::new(
            config,
            Arc::new(StaticStateSource::new(StateSnapshot::at_block(1))),
        ))
    }

    #[test]
    fn test_invalid_bind_address() {
        let mut config = Config::default();
        config.server.host = "not a host".to_string();

        assert!(ApiServer::new(state_with(config)).is_err());
    }

    #[tokio::test]
    async fn test_body_limit_is_enforced() {
        let mut config = Config::default();
        config.server.max_body_size = 16;
        let app = build_router(state_with(config));

        let request = Request::builder()
            .method("POST")
            .uri("/v1/conditional/validate")
            .header("content-type", "application/json")
            .header("content-length", "64")
            .body(Body::from(vec![b' '; 64]))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_cors_headers() {
        let app = build_router(state_with(Config::default()));

        let request = Request::builder()
            .uri("/healthz")
            .header("origin", "https://example.org")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
    }
}
