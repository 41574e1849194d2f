//! Liveness and readiness check, mounted at the root (`/health`).

use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the database does not answer.
    pub status: &'static str,
    pub version: &'static str,
    pub database: DatabaseHealth,
    /// Active payment provider (`stripe` or `mock`).
    pub payments: &'static str,
}

#[derive(Debug, Serialize)]
pub struct DatabaseHealth {
    pub healthy: bool,
    /// Round trip of the check query; absent when it failed.
    pub latency_ms: Option<u64>,
}

/// GET /health
///
/// 200 when the database answers, 503 otherwise. Booking cannot work
/// without the database, so orchestrators should route traffic away.
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let started = Instant::now();
    let database = match cinema_db::health_check(&state.pool).await {
        Ok(()) => DatabaseHealth {
            healthy: true,
            latency_ms: Some(started.elapsed().as_millis() as u64),
        },
        Err(e) => {
            tracing::warn!(error = %e, "Health check: database unreachable");
            DatabaseHealth {
                healthy: false,
                latency_ms: None,
            }
        }
    };

    let (code, status) = if database.healthy {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
            database,
            payments: state.payments.name(),
        }),
    )
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
