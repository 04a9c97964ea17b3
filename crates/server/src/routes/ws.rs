// crates/server/src/routes/ws.rs
//! GET /ws/{id} - push job progress to a WebSocket subscriber.
//!
//! One JSON frame per poll interval until the job reaches a terminal state,
//! then a normal close. Unknown ids get a single `{"status":"error"}` frame.

use std::sync::Arc;

use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use letterscope_core::JobId;
use letterscope_server_jobs::progress_frames;

use crate::state::AppState;

async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(job_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, JobId::from(job_id), state))
}

async fn handle_socket(socket: WebSocket, job_id: JobId, state: Arc<AppState>) {
    tracing::info!(job_id = %job_id, "Progress subscriber connected");
    let (mut sink, mut incoming) = socket.split();

    let frames = progress_frames(Arc::clone(&state.registry), job_id.clone(), state.poll_interval);
    let mut frames = std::pin::pin!(frames);

    loop {
        tokio::select! {
            frame = frames.next() => {
                let Some(frame) = frame else { break };
                let json = match serde_json::to_string(&frame) {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::error!(job_id = %job_id, error = %e, "Failed to encode status frame");
                        break;
                    }
                };
                if sink.send(Message::Text(json.into())).await.is_err() {
                    tracing::debug!(job_id = %job_id, "Subscriber went away mid-stream");
                    return;
                }
                if frame.is_terminal() {
                    let _ = sink
                        .send(Message::Close(Some(CloseFrame {
                            code: close_code::NORMAL,
                            reason: "job finished".into(),
                        })))
                        .await;
                    break;
                }
            }
            msg = incoming.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => {
                        tracing::info!(job_id = %job_id, "Progress subscriber disconnected");
                        return;
                    }
                    // Client payloads are ignored.
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    tracing::info!(job_id = %job_id, "Progress stream closed");
}

/// Build the WebSocket router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/ws/{id}", get(ws_handler))
}
