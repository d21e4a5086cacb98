//! API route definitions

use crate::api::handlers;
use crate::app::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Create the main API router
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/v1/conditional/validate", post(handlers::validate_conditional))

        // Health and status endpoints
        .route("/healthz", get(handlers::health_check))
        .route("/status", get(handlers::system_status))
}
