// crates/server/src/routes/health.rs
//! GET /health - liveness plus a coarse view of the work in flight.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Body of the health check: `{"status":"ok","version":..,"uptime_secs":..,"jobs":{..},"upload_sessions":..}`.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub jobs: JobCounts,
    /// Uploads the assembler is still tracking, finished ones included until
    /// they go idle.
    pub upload_sessions: usize,
}

#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct JobCounts {
    /// Every job since startup; the registry never evicts.
    pub total: usize,
    pub active: usize,
}

/// GET /api/health
///
/// Returns server status, version, uptime and how many jobs are still pending
/// or running.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.uptime_secs(),
        jobs: JobCounts {
            total: state.registry.len(),
            active: state.registry.active_count(),
        },
        upload_sessions: state.assembler.session_count(),
    })
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health_check))
}
