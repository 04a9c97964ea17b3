// crates/server-jobs/src/runner.rs
//! Schedules and drives analysis jobs.

use std::sync::Arc;
use std::time::{Duration, Instant};

use letterscope_core::{analyze, Extractor, JobId, LetterHistogram};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::pipeline::{describe_join_error, extract_with_deadline, DEFAULT_EXTRACT_TIMEOUT};
use crate::registry::JobRegistry;

/// Tuning knobs for [`JobRunner`].
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Hard deadline for text extraction.
    pub extract_timeout: Duration,
    /// Maximum number of jobs extracting/analyzing at once. `0` = unbounded.
    pub max_concurrent_jobs: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            extract_timeout: DEFAULT_EXTRACT_TIMEOUT,
            max_concurrent_jobs: 0,
        }
    }
}

/// Runs one background task per completed upload.
///
/// Tasks only communicate through the shared [`JobRegistry`]. A job that
/// fails for any reason (unreadable file, unsupported or malformed input,
/// deadline, decoder panic) is recorded as `Failed` on its own entry and
/// never affects other jobs.
pub struct JobRunner {
    registry: Arc<JobRegistry>,
    extractor: Arc<dyn Extractor>,
    extract_timeout: Duration,
    permits: Option<Arc<Semaphore>>,
}

impl JobRunner {
    pub fn new(
        registry: Arc<JobRegistry>,
        extractor: Arc<dyn Extractor>,
        config: RunnerConfig,
    ) -> Self {
        let permits = (config.max_concurrent_jobs > 0)
            .then(|| Arc::new(Semaphore::new(config.max_concurrent_jobs)));
        Self {
            registry,
            extractor,
            extract_timeout: config.extract_timeout,
            permits,
        }
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    /// Spawn processing of a completed upload for an already-registered job.
    ///
    /// The job must exist in the registry before this is called so that a
    /// status query racing the task always finds it. `data` is a snapshot of
    /// the upload; later writes to the same destination do not affect it.
    pub fn spawn(&self, job_id: JobId, file_name: String, data: Vec<u8>) -> JoinHandle<()> {
        let worker = self.worker();
        tokio::spawn(async move { worker.process(job_id, file_name, data).await })
    }

    fn worker(&self) -> Worker {
        Worker {
            registry: Arc::clone(&self.registry),
            extractor: Arc::clone(&self.extractor),
            extract_timeout: self.extract_timeout,
            permits: self.permits.clone(),
        }
    }
}

/// Everything one job task needs, detached from the runner.
struct Worker {
    registry: Arc<JobRegistry>,
    extractor: Arc<dyn Extractor>,
    extract_timeout: Duration,
    permits: Option<Arc<Semaphore>>,
}

impl Worker {
    async fn process(self, job_id: JobId, file_name: String, data: Vec<u8>) {
        // Queued jobs stay Pending at 0% until a slot frees up.
        let _permit = match &self.permits {
            Some(permits) => match Arc::clone(permits).acquire_owned().await {
                Ok(permit) => Some(permit),
                Err(_) => {
                    self.fail(&job_id, "job runner is shutting down");
                    return;
                }
            },
            None => None,
        };

        let started = Instant::now();
        self.registry.update(&job_id, |job| job.start());
        tracing::info!(job_id = %job_id, file_name = %file_name, bytes = data.len(), "Job running");

        let text = match extract_with_deadline(
            Arc::clone(&self.extractor),
            file_name.clone(),
            data,
            self.extract_timeout,
        )
        .await
        {
            Ok(text) => text,
            Err(e) => {
                self.fail(&job_id, e.to_string());
                return;
            }
        };

        match self.count_letters(&job_id, text).await {
            Ok(histogram) => {
                self.registry.update(&job_id, |job| job.complete(histogram));
                tracing::info!(
                    job_id = %job_id,
                    letters = histogram.total(),
                    duration_ms = started.elapsed().as_millis() as u64,
                    "Job completed"
                );
            }
            Err(message) => self.fail(&job_id, message),
        }
    }

    /// CPU-bound counting pass on the blocking pool, publishing progress
    /// through the registry as it goes.
    async fn count_letters(&self, job_id: &JobId, text: String) -> Result<LetterHistogram, String> {
        let registry = Arc::clone(&self.registry);
        let id = job_id.clone();
        tokio::task::spawn_blocking(move || {
            let mut last_reported = None;
            analyze(&text, |percent| {
                if last_reported != Some(percent) {
                    last_reported = Some(percent);
                    registry.update(&id, |job| job.advance(percent));
                }
            })
        })
        .await
        .map_err(|e| format!("analysis aborted: {}", describe_join_error(e)))
    }

    fn fail(&self, job_id: &JobId, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(job_id = %job_id, error = %message, "Job failed");
        self.registry.update(job_id, |job| job.fail(message));
    }
}
