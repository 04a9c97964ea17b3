// crates/server/src/routes/jobs.rs
//! API routes for analysis jobs.
//!
//! - GET /jobs/{id} - Snapshot of one job
//! - GET /jobs/{id}/stream - SSE stream of status frames until the job finishes

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use axum::{Json, Router};
use letterscope_core::{Job, JobId};
use letterscope_server_jobs::progress_frames;
use tokio_stream::{Stream, StreamExt};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// GET /api/jobs/{id} - Current state of a job.
async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<Job>> {
    state
        .registry
        .get(&JobId::from(job_id.as_str()))
        .map(Json)
        .ok_or(ApiError::JobNotFound(job_id))
}

/// GET /api/jobs/{id}/stream - Same frames as the WebSocket, as SSE.
async fn stream_job(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let frames = progress_frames(
        Arc::clone(&state.registry),
        JobId::from(job_id),
        state.poll_interval,
    );
    Sse::new(frames.map(|frame| Event::default().json_data(&frame))).keep_alive(KeepAlive::default())
}

/// Build the jobs router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/jobs/{id}", get(get_job))
        .route("/jobs/{id}/stream", get(stream_job))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::config::ServerConfig;

    fn test_state(dir: &tempfile::TempDir) -> Arc<AppState> {
        let config = ServerConfig {
            upload_dir: dir.path().to_path_buf(),
            poll_interval_ms: 10,
            ..ServerConfig::default()
        };
        AppState::new(&config).unwrap()
    }

    async fn get_body(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_get_job_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        state.registry.create(JobId::from("j1"), "notes.txt").unwrap();

        let app = router().with_state(state);
        let (status, body) = get_body(app, "/jobs/j1").await;

        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["id"], "j1");
        assert_eq!(json["file_name"], "notes.txt");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["progress"], 0);
    }

    #[tokio::test]
    async fn test_get_unknown_job_returns_404() {
        let dir = tempfile::tempdir().unwrap();
        let app = router().with_state(test_state(&dir));
        let (status, body) = get_body(app, "/jobs/nope").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("Job not found"));
    }

    #[tokio::test]
    async fn test_stream_ends_after_terminal_frame() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let id = JobId::from("j2");
        state.registry.create(id.clone(), "a.txt").unwrap();
        state.registry.update(&id, |job| job.fail("boom"));

        let app = router().with_state(state);
        let (status, body) = get_body(app, "/jobs/j2/stream").await;

        assert_eq!(status, StatusCode::OK);
        let frames: Vec<&str> = body
            .lines()
            .filter_map(|line| line.strip_prefix("data: "))
            .collect();
        assert_eq!(frames.len(), 1);
        let frame: serde_json::Value = serde_json::from_str(frames[0]).unwrap();
        assert_eq!(frame["status"], "failed");
        assert_eq!(frame["error"], "boom");
    }

    #[tokio::test]
    async fn test_stream_unknown_job_yields_error_frame() {
        let dir = tempfile::tempdir().unwrap();
        let app = router().with_state(test_state(&dir));
        let (_, body) = get_body(app, "/jobs/missing/stream").await;

        assert!(body.contains(r#"{"status":"error","error":"job not found"}"#));
    }
}
