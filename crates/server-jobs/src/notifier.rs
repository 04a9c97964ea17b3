// crates/server-jobs/src/notifier.rs
//! Polling progress notifier.
//!
//! Each subscriber gets its own stream: sleep one interval, snapshot the job,
//! emit a [`StatusFrame`], and stop right after the first terminal frame.
//! The stream only reads the registry; dropping it never affects the job.

use std::sync::Arc;
use std::time::Duration;

use letterscope_core::{Job, JobId, JobStatus, LetterHistogram};
use serde::{Deserialize, Serialize};
use tokio_stream::Stream;

use crate::registry::JobRegistry;

/// Reference polling cadence.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Message sent for an unknown job id.
pub const JOB_NOT_FOUND: &str = "job not found";

/// One status update pushed to a subscriber.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum StatusFrame {
    InProgress { progress: u8 },
    Completed { progress: u8, result: LetterHistogram },
    Failed { progress: u8, error: String },
    Error { error: String },
}

impl StatusFrame {
    /// Frame describing a registry snapshot (`None` = unknown id).
    pub fn for_snapshot(job: Option<&Job>) -> Self {
        let Some(job) = job else {
            return Self::Error {
                error: JOB_NOT_FOUND.to_string(),
            };
        };
        match job.status {
            JobStatus::Completed => Self::Completed {
                progress: 100,
                result: job.result.unwrap_or_default(),
            },
            JobStatus::Failed => Self::Failed {
                progress: 100,
                error: job
                    .error
                    .clone()
                    .unwrap_or_else(|| "job failed".to_string()),
            },
            JobStatus::Pending | JobStatus::Running => Self::InProgress {
                progress: job.progress,
            },
        }
    }

    /// Whether the stream ends after this frame.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InProgress { .. })
    }
}

/// Stream of status frames for `job_id`, one per `interval`, ending after
/// the first terminal frame.
pub fn progress_frames(
    registry: Arc<JobRegistry>,
    job_id: JobId,
    interval: Duration,
) -> impl Stream<Item = StatusFrame> + Send + 'static {
    async_stream::stream! {
        loop {
            tokio::time::sleep(interval).await;
            let frame = StatusFrame::for_snapshot(registry.get(&job_id).as_ref());
            let done = frame.is_terminal();
            yield frame;
            if done {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_frame_serialization() {
        let json = serde_json::to_value(StatusFrame::InProgress { progress: 42 }).unwrap();
        assert_eq!(json, serde_json::json!({"status": "in-progress", "progress": 42}));

        let json = serde_json::to_value(StatusFrame::Error {
            error: JOB_NOT_FOUND.into(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"status": "error", "error": "job not found"}));

        let json = serde_json::to_value(StatusFrame::Failed {
            progress: 100,
            error: "boom".into(),
        })
        .unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["progress"], 100);

        let json = serde_json::to_value(StatusFrame::Completed {
            progress: 100,
            result: LetterHistogram::new(),
        })
        .unwrap();
        assert_eq!(json["status"], "completed");
        assert_eq!(json["result"].as_array().unwrap().len(), 26);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_job_yields_single_error_frame() {
        let registry = Arc::new(JobRegistry::new());
        let frames: Vec<_> = progress_frames(registry, JobId::from("nope"), DEFAULT_POLL_INTERVAL)
            .collect()
            .await;
        assert_eq!(
            frames,
            vec![StatusFrame::Error {
                error: JOB_NOT_FOUND.into()
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_follows_job_until_completion() {
        let registry = Arc::new(JobRegistry::new());
        let id = JobId::from("job-stream");
        registry.create(id.clone(), "a.txt").unwrap();

        let stream = progress_frames(Arc::clone(&registry), id.clone(), DEFAULT_POLL_INTERVAL);
        tokio::pin!(stream);

        assert_eq!(stream.next().await, Some(StatusFrame::InProgress { progress: 0 }));

        registry.update(&id, |job| {
            job.start();
            job.advance(55);
        });
        assert_eq!(stream.next().await, Some(StatusFrame::InProgress { progress: 55 }));

        let mut h = LetterHistogram::new();
        h.record(b'x');
        registry.update(&id, |job| job.complete(h));
        assert_eq!(
            stream.next().await,
            Some(StatusFrame::Completed {
                progress: 100,
                result: h
            })
        );
        assert_eq!(stream.next().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_job_ends_stream_with_failed_frame() {
        let registry = Arc::new(JobRegistry::new());
        let id = JobId::from("job-fail");
        registry.create(id.clone(), "a.exe").unwrap();
        registry.update(&id, |job| job.fail("unsupported file type: .exe"));

        let frames: Vec<_> = progress_frames(registry, id, DEFAULT_POLL_INTERVAL)
            .collect()
            .await;
        assert_eq!(
            frames,
            vec![StatusFrame::Failed {
                progress: 100,
                error: "unsupported file type: .exe".into()
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_frame_waits_one_interval() {
        let registry = Arc::new(JobRegistry::new());
        let started = tokio::time::Instant::now();
        let stream = progress_frames(registry, JobId::from("x"), Duration::from_secs(1));
        tokio::pin!(stream);
        stream.next().await;
        assert!(started.elapsed() >= Duration::from_secs(1));
    }
}
