// crates/server/src/routes/upload.rs
//! POST /upload - receive one chunk of a file.
//!
//! Multipart fields: `fileName`, `chunkIndex`, `totalChunks`, `chunk` (binary).

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::upload::{Chunk, ChunkReceipt};

/// Response body: `{"status":"chunk received"}` or `{"job_id":"..."}`.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum UploadResponse {
    Received { status: &'static str },
    JobCreated { job_id: String },
}

impl From<ChunkReceipt> for UploadResponse {
    fn from(receipt: ChunkReceipt) -> Self {
        match receipt {
            ChunkReceipt::Received => Self::Received {
                status: "chunk received",
            },
            ChunkReceipt::Completed { job_id } => Self::JobCreated {
                job_id: job_id.to_string(),
            },
        }
    }
}

#[derive(Default)]
struct ChunkForm {
    file_name: Option<String>,
    chunk_index: Option<String>,
    total_chunks: Option<String>,
    chunk: Option<Bytes>,
}

async fn upload_chunk(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let mut form = ChunkForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read multipart field: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        let read_err = |e: MultipartError| ApiError::BadRequest(format!("Failed to read field {name}: {e}"));
        match name.as_str() {
            "fileName" => form.file_name = Some(field.text().await.map_err(read_err)?),
            "chunkIndex" => form.chunk_index = Some(field.text().await.map_err(read_err)?),
            "totalChunks" => form.total_chunks = Some(field.text().await.map_err(read_err)?),
            "chunk" => form.chunk = Some(field.bytes().await.map_err(read_err)?),
            _ => {}
        }
    }

    let file_name = form
        .file_name
        .ok_or_else(|| ApiError::BadRequest("Missing fileName".into()))?;
    let index = parse_index("chunkIndex", form.chunk_index)?;
    let total = parse_index("totalChunks", form.total_chunks)?;
    let bytes = form
        .chunk
        .ok_or_else(|| ApiError::BadRequest("No chunk uploaded".into()))?;

    let receipt = state
        .assembler
        .receive_chunk(Chunk {
            file_name: &file_name,
            index,
            total,
            bytes: &bytes,
        })
        .await?;
    Ok(Json(receipt.into()))
}

fn parse_index(field: &str, value: Option<String>) -> ApiResult<u32> {
    let value = value.ok_or_else(|| ApiError::BadRequest(format!("Missing {field}")))?;
    value
        .trim()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("{field} must be a non-negative integer, got {value:?}")))
}

/// Build the upload router with the configured body limit.
pub fn router(max_body_bytes: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route("/upload", post(upload_chunk))
        .layer(DefaultBodyLimit::max(max_body_bytes))
}
