//! HTTP API request handlers

use crate::app::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::Json,
};
use config::LimitsConfig;
use serde_json::{json, Value};
use std::sync::Arc;
use types::utils::sanitize_for_logging;
use types::{ConditionalTransactionRequest, ConditionalTxError, EnvelopeFields, KnownAccounts};

type ApiResult = Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)>;

/// Map an error to its HTTP status
fn error_status(err: &ConditionalTxError) -> StatusCode {
    match err {
        ConditionalTxError::Transaction(_) | ConditionalTxError::LimitExceeded(_) => {
            StatusCode::BAD_REQUEST
        }
        // The verdict is undetermined, the caller may retry
        ConditionalTxError::StateAccess(_) => StatusCode::SERVICE_UNAVAILABLE,
        ConditionalTxError::Config(_) | ConditionalTxError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Render an error as `{"error": "..."}`
fn error_response(err: impl Into<ConditionalTxError>) -> (StatusCode, Json<Value>) {
    let err = err.into();
    let status = error_status(&err);
    if status.is_server_error() {
        tracing::warn!(error = %err, "Request failed");
    } else {
        tracing::debug!(error = %err, "Rejected request");
    }

    (status, Json(json!({ "error": err.to_string() })))
}

/// Reject requests that would need more state reads than allowed
fn check_limits(limits: &LimitsConfig, known_accounts: &KnownAccounts) -> Result<(), ConditionalTxError> {
    if known_accounts.len() > limits.max_known_accounts {
        return Err(ConditionalTxError::LimitExceeded(format!(
            "{} known accounts declared, at most {} allowed",
            known_accounts.len(),
            limits.max_known_accounts
        )));
    }

    if known_accounts.slot_count() > limits.max_known_slots {
        return Err(ConditionalTxError::LimitExceeded(format!(
            "{} known slots declared, at most {} allowed",
            known_accounts.slot_count(),
            limits.max_known_slots
        )));
    }

    Ok(())
}

/// Validate a conditional transaction against current chain state
pub async fn validate_conditional(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult {
    // Parsed by hand so that malformed preconditions map to 400
    let request: ConditionalTransactionRequest = serde_json::from_slice(&body)
        .map_err(|e| error_response(ConditionalTxError::Transaction(e.to_string())))?;

    check_limits(&state.config.limits, &request.known_accounts).map_err(error_response)?;

    let tx = request.decode().map_err(error_response)?;
    let tx_hash = tx.hash();

    if let (Some(expected), Some(actual)) = (state.config.network.chain_id, tx.chain_id()) {
        if expected != actual {
            return Err(error_response(ConditionalTxError::Transaction(format!(
                "chain id {} does not match network chain id {}",
                actual, expected
            ))));
        }
    }

    let outcome = state.validator.validate(&tx).await.map_err(error_response)?;
    let known_accounts = tx.known_accounts().map(KnownAccounts::len).unwrap_or_default();

    tracing::info!(
        tx_hash = %sanitize_for_logging(&tx_hash.to_string()),
        known_accounts,
        valid = outcome.is_valid,
        block_number = ?outcome.block_number,
        "Conditional transaction validated"
    );

    Ok((
        StatusCode::OK,
        Json(json!({
            "valid": outcome.is_valid,
            "txHash": tx_hash,
            "txType": format!("{:#04x}", tx.tx_type()),
            "knownAccounts": known_accounts,
            "blockNumber": outcome.block_number,
        })),
    ))
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> ApiResult {
    let source_healthy = state.source().is_available().await;

    let status = if source_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    Ok((
        status,
        Json(json!({
            "status": if source_healthy { "healthy" } else { "unhealthy" },
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "components": {
                "stateSource": if source_healthy { "healthy" } else { "unhealthy" }
            }
        })),
    ))
}

/// System status endpoint with more detailed information
pub async fn system_status(State(state): State<Arc<AppState>>) -> ApiResult {
    let source = state.source();
    let source_healthy = source.is_available().await;

    Ok((
        StatusCode::OK,
        Json(json!({
            "service": "conditional-tx-gateway",
            "version": env!("CARGO_PKG_VERSION"),
            "status": if source_healthy { "operational" } else { "degraded" },
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "startedAt": state.started_at.to_rfc3339(),
            "uptimeSeconds": state.uptime_seconds(),
            "components": {
                "stateSource": {
                    "name": source.name(),
                    "status": if source_healthy { "healthy" } else { "unhealthy" }
                },
                "configuration": {
                    "network": state.config.network.network,
                    "chainId": state.config.network.chain_id,
                    "maxKnownAccounts": state.config.limits.max_known_accounts,
                    "maxKnownSlots": state.config.limits.max_known_slots
                }
            }
        })),
    ))
}
