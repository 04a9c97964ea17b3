// crates/server/src/state.rs
//! Application state for the Axum server.

use std::sync::Arc;
use std::time::{Duration, Instant};

use letterscope_core::{Extractor, FormatExtractor, StorageError};
use letterscope_server_jobs::{JobRegistry, JobRunner, RunnerConfig};

use crate::config::ServerConfig;
use crate::storage::UploadStore;
use crate::upload::ChunkAssembler;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    /// Server start time for uptime tracking.
    pub start_time: Instant,
    /// Job registry shared by the assembler, the runner and the notifiers.
    pub registry: Arc<JobRegistry>,
    /// Appends chunks and creates jobs for completed uploads.
    pub assembler: ChunkAssembler,
    /// Delay between progress frames pushed to subscribers.
    pub poll_interval: Duration,
    /// Request body limit for `/upload`.
    pub max_body_bytes: usize,
    /// CORS origin restriction, if any.
    pub allowed_origin: Option<String>,
}

impl AppState {
    /// Build state from configuration using the default format extractor.
    pub fn new(config: &ServerConfig) -> Result<Arc<Self>, StorageError> {
        Self::with_extractor(config, Arc::new(FormatExtractor))
    }

    /// Build state with a custom extractor (used by tests to simulate slow or
    /// crashing decoders).
    pub fn with_extractor(
        config: &ServerConfig,
        extractor: Arc<dyn Extractor>,
    ) -> Result<Arc<Self>, StorageError> {
        let store = UploadStore::open(&config.upload_dir)?;
        let registry = Arc::new(JobRegistry::new());
        let runner = JobRunner::new(
            Arc::clone(&registry),
            extractor,
            RunnerConfig {
                extract_timeout: config.extract_timeout(),
                max_concurrent_jobs: config.max_concurrent_jobs(),
            },
        );

        Ok(Arc::new(Self {
            start_time: Instant::now(),
            registry,
            assembler: ChunkAssembler::new(store, Arc::new(runner), config.upload_session_timeout()),
            poll_interval: config.poll_interval(),
            max_body_bytes: config.max_body_bytes,
            allowed_origin: config.allowed_origin.clone(),
        }))
    }

    /// Get the server uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
