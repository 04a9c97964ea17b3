// crates/server-jobs/src/pipeline.rs
//! Deadline-bounded text extraction.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use letterscope_core::{ExtractionError, Extractor};
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

/// Reference deadline for a single extraction.
pub const DEFAULT_EXTRACT_TIMEOUT: Duration = Duration::from_secs(10);

/// Run `extractor` on a blocking thread and race it against `timeout`.
///
/// - Decoder errors map to [`ExtractionError::Unsupported`] / [`ExtractionError::Malformed`].
/// - A panic inside the decoder is caught at the task boundary and reported as
///   [`ExtractionError::Malformed`]; it never unwinds into the caller.
/// - If the deadline elapses first, the decoder's cancellation token fires so it
///   can stop at its next checkpoint, and [`ExtractionError::Timeout`] is returned.
///
/// The token is also cancelled if this future is dropped early.
pub async fn extract_with_deadline(
    extractor: Arc<dyn Extractor>,
    file_name: String,
    data: Vec<u8>,
    timeout: Duration,
) -> Result<String, ExtractionError> {
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let task_cancel = cancel.clone();
    let handle = tokio::task::spawn_blocking(move || {
        extractor.extract(&file_name, &data, &task_cancel)
    });

    match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(result)) => result.map_err(ExtractionError::from),
        Ok(Err(join_err)) => Err(ExtractionError::Malformed {
            message: describe_join_error(join_err),
        }),
        Err(_elapsed) => {
            cancel.cancel();
            Err(ExtractionError::Timeout { after: timeout })
        }
    }
}

/// Human-readable reason for an abnormally terminated task.
pub(crate) fn describe_join_error(err: JoinError) -> String {
    if err.is_panic() {
        format!("decoder crashed: {}", panic_message(err.into_panic()))
    } else {
        "decoder task was cancelled".to_string()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
