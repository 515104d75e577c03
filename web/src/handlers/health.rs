//! Health check endpoints.
//!
//! These endpoints are used by load balancers and monitoring systems
//! to verify service health.

use crate::{AppError, AppState};
use axum::{Json, extract::State};
use growhub_core::LedgerStore;
use serde::Serialize;

/// Health response body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `"ok"` or `"ready"`
    pub status: &'static str,
    /// Crate version
    pub version: &'static str,
}

/// Liveness: the process is up. Does NOT check the database.
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Readiness: the Ledger Store answers a round-trip.
///
/// # Status Codes
///
/// - 200 OK: the store is reachable
/// - 503 Service Unavailable: it is not
///
/// # Errors
///
/// Returns [`AppError`] (503) if the ping fails.
pub async fn readiness<S: LedgerStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<HealthResponse>, AppError> {
    state.commerce.store().ping().await.map_err(|e| {
        AppError::unavailable("Ledger Store unreachable").with_source(anyhow::Error::new(e))
    })?;

    Ok(Json(HealthResponse {
        status: "ready",
        version: env!("CARGO_PKG_VERSION"),
    }))
}
