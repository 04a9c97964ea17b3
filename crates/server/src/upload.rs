// crates/server/src/upload.rs
//! Chunked upload reassembly.
//!
//! Chunks for a file arrive as separate requests. Each is appended to the
//! destination file; the final chunk registers a job and schedules its
//! analysis before the job id is returned to the uploader.

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use letterscope_core::{JobId, RegistryError, StorageError};
use letterscope_server_jobs::JobRunner;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::storage::UploadStore;

/// Errors surfaced synchronously to the uploader. No job is created.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("invalid chunk: {0}")]
    InvalidChunk(String),

    #[error("chunk {got} received out of order, expected chunk {expected}")]
    OutOfOrder { expected: u32, got: u32 },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// One received chunk.
#[derive(Debug, Clone)]
pub struct Chunk<'a> {
    pub file_name: &'a str,
    pub index: u32,
    pub total: u32,
    pub bytes: &'a [u8],
}

/// Result of accepting a chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkReceipt {
    /// A non-final chunk was stored (or was a harmless duplicate).
    Received,
    /// The upload is complete and this job analyzes it.
    Completed { job_id: JobId },
}

/// How long an upload session may sit idle before it is forgotten.
pub const DEFAULT_SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(600);

/// Progress of one file's upload.
#[derive(Debug)]
struct UploadSession {
    total_chunks: u32,
    next_index: u32,
    job_id: Option<JobId>,
    last_activity: Instant,
}

impl UploadSession {
    fn new(total_chunks: u32) -> Self {
        Self {
            total_chunks,
            next_index: 0,
            job_id: None,
            last_activity: Instant::now(),
        }
    }
}

type SessionSlot = Arc<Mutex<Option<UploadSession>>>;

/// Appends chunks to destination files and creates a job per completed upload.
///
/// Sessions are keyed by file name. Chunk 0 starts a new session (truncating
/// the destination); every following chunk must carry the next index. A
/// repeat of the last accepted chunk is acknowledged without writing, and a
/// repeated final chunk returns the job already created for that upload.
/// A chunk 0 only counts as a repeat if the destination still holds exactly
/// its bytes; anything else is a new upload under the same name.
///
/// Sessions idle for longer than the idle timeout are dropped, finished or
/// not.
pub struct ChunkAssembler {
    store: UploadStore,
    runner: Arc<JobRunner>,
    sessions: DashMap<String, SessionSlot>,
    idle_timeout: Duration,
}

impl ChunkAssembler {
    pub fn new(store: UploadStore, runner: Arc<JobRunner>, idle_timeout: Duration) -> Self {
        Self {
            store,
            runner,
            sessions: DashMap::new(),
            idle_timeout,
        }
    }

    pub fn store(&self) -> &UploadStore {
        &self.store
    }

    /// Number of upload sessions currently tracked.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub async fn receive_chunk(&self, chunk: Chunk<'_>) -> Result<ChunkReceipt, UploadError> {
        if chunk.total == 0 {
            return Err(UploadError::InvalidChunk(
                "totalChunks must be at least 1".into(),
            ));
        }
        if chunk.index >= chunk.total {
            return Err(UploadError::InvalidChunk(format!(
                "chunkIndex {} is not below totalChunks {}",
                chunk.index, chunk.total
            )));
        }
        let path = self.store.path_for(chunk.file_name)?;

        self.prune_idle();
        let mut slot = self.lock_session(chunk.file_name).await;

        if chunk.index == 0 {
            let resent = match slot.as_ref() {
                Some(s) if s.next_index == 1 && s.total_chunks == chunk.total => {
                    self.store.holds(&path, chunk.bytes).await
                }
                _ => false,
            };
            if !resent {
                *slot = Some(UploadSession::new(chunk.total));
            }
        }
        let Some(session) = slot.as_mut() else {
            return Err(UploadError::OutOfOrder {
                expected: 0,
                got: chunk.index,
            });
        };
        if session.total_chunks != chunk.total {
            return Err(UploadError::InvalidChunk(format!(
                "totalChunks changed from {} to {} mid-upload",
                session.total_chunks, chunk.total
            )));
        }
        session.last_activity = Instant::now();

        match chunk.index.cmp(&session.next_index) {
            Ordering::Equal => {}
            Ordering::Less if chunk.index + 1 == session.next_index => {
                tracing::debug!(
                    file_name = %chunk.file_name,
                    chunk_index = chunk.index,
                    "Duplicate chunk ignored"
                );
                return Ok(match &session.job_id {
                    Some(job_id) => ChunkReceipt::Completed {
                        job_id: job_id.clone(),
                    },
                    None => ChunkReceipt::Received,
                });
            }
            _ => {
                return Err(UploadError::OutOfOrder {
                    expected: session.next_index,
                    got: chunk.index,
                });
            }
        }

        if chunk.index == 0 {
            self.store.write_first(&path, chunk.bytes).await?;
        } else {
            self.store.append(&path, chunk.bytes).await?;
        }
        session.next_index += 1;

        if chunk.index + 1 < chunk.total {
            return Ok(ChunkReceipt::Received);
        }

        // Snapshot the file while the session is still locked: a new upload
        // under the same name truncates it as soon as the lock is released.
        let data = match self.store.read_all(&path).await {
            Ok(data) => data,
            Err(e) => {
                *slot = None;
                return Err(e.into());
            }
        };

        // Register before spawning so a status query can never miss the job.
        let job_id = JobId::generate();
        self.runner
            .registry()
            .create(job_id.clone(), chunk.file_name)?;
        if let Some(session) = slot.as_mut() {
            session.job_id = Some(job_id.clone());
        }
        tracing::info!(
            job_id = %job_id,
            file_name = %chunk.file_name,
            chunks = chunk.total,
            bytes = data.len(),
            "Upload complete, job created"
        );
        self.runner
            .spawn(job_id.clone(), chunk.file_name.to_string(), data);

        Ok(ChunkReceipt::Completed { job_id })
    }

    /// Lock the session slot for `file_name`, retrying if the slot was pruned
    /// between lookup and lock.
    async fn lock_session(&self, file_name: &str) -> OwnedMutexGuard<Option<UploadSession>> {
        loop {
            let cell = Arc::clone(&*self.sessions.entry(file_name.to_string()).or_default());
            let guard = Arc::clone(&cell).lock_owned().await;
            let current = self
                .sessions
                .get(file_name)
                .is_some_and(|entry| Arc::ptr_eq(entry.value(), &cell));
            if current {
                return guard;
            }
        }
    }

    /// Forget sessions nobody has touched within the idle timeout. Slots in
    /// use are skipped.
    fn prune_idle(&self) {
        let idle_timeout = self.idle_timeout;
        self.sessions.retain(|_, cell| {
            let Ok(slot) = cell.try_lock() else {
                return true;
            };
            slot.as_ref()
                .is_some_and(|s| s.last_activity.elapsed() < idle_timeout)
        });
    }
}
