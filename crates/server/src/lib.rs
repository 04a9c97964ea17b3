// crates/server/src/lib.rs
//! Letterscope server library.
//!
//! Accepts files as ordered chunks, reassembles them on disk, and runs a
//! background letter-frequency job per completed upload. Progress is pushed
//! over WebSocket (`/ws/{id}`) or SSE (`/api/jobs/{id}/stream`).

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod storage;
pub mod upload;

pub use config::ServerConfig;
pub use error::*;
pub use routes::api_routes;
pub use state::AppState;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the Axum application with all routes and middleware.
///
/// CORS allows any origin unless `allowed_origin` is configured.
pub fn create_app(state: Arc<AppState>) -> Router {
    let origin = match state.allowed_origin.as_deref().map(HeaderValue::from_str) {
        Some(Ok(origin)) => AllowOrigin::exact(origin),
        Some(Err(e)) => {
            tracing::warn!(error = %e, "Ignoring invalid allowed origin; allowing any");
            AllowOrigin::from(Any)
        }
        None => AllowOrigin::from(Any),
    };
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api_routes(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

// ============================================================================
// Integration Tests
// ============================================================================
