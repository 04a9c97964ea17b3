//! HTTP and WebSocket route handlers.

pub mod health;
pub mod jobs;
pub mod upload;
pub mod ws;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Create the combined router.
///
/// Routes:
/// - POST /upload - Receive one chunk of a file; the last chunk creates a job
/// - GET /ws/{id} - WebSocket stream of job progress
/// - GET /api/health - Health check
/// - GET /api/jobs/{id} - Job snapshot
/// - GET /api/jobs/{id}/stream - SSE stream of job progress
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(upload::router(state.max_body_bytes))
        .merge(ws::router())
        .nest("/api", health::router())
        .nest("/api", jobs::router())
        .with_state(state)
}
