// crates/server-jobs/src/registry.rs
//! In-memory registry of analysis jobs.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use letterscope_core::{Job, JobId, RegistryError};

/// Concurrency-safe arena of jobs keyed by [`JobId`].
///
/// Every read and write goes through one mutex, so a reader never observes a
/// job mid-update (including its 26-bucket histogram). Callers only ever get
/// cloned snapshots; the map and the guard stay private. Entries are never
/// evicted for the lifetime of the process.
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: Mutex<HashMap<JobId, Job>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new `Pending` job at 0%.
    ///
    /// Fails without touching the existing entry if `id` is already present,
    /// so a repeated trigger can never reset a job's progress.
    pub fn create(&self, id: JobId, file_name: impl Into<String>) -> Result<(), RegistryError> {
        let mut jobs = self.lock();
        if jobs.contains_key(&id) {
            return Err(RegistryError::AlreadyExists(id.to_string()));
        }
        let job = Job::new(id.clone(), file_name);
        jobs.insert(id, job);
        Ok(())
    }

    /// Snapshot of a job, or `None` for an unknown id.
    pub fn get(&self, id: &JobId) -> Option<Job> {
        self.lock().get(id).cloned()
    }

    /// Apply `f` to a job while holding the guard.
    ///
    /// Returns `None` (and does nothing) when the id is unknown.
    pub fn update<F, R>(&self, id: &JobId, f: F) -> Option<R>
    where
        F: FnOnce(&mut Job) -> R,
    {
        self.lock().get_mut(id).map(f)
    }

    /// Jobs still pending or running.
    pub fn active_count(&self) -> usize {
        self.lock().values().filter(|job| !job.is_terminal()).count()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<JobId, Job>> {
        // Job transitions are guarded and leave a job consistent even if a
        // caller's closure panics, so a poisoned map is still usable.
        self.jobs.lock().unwrap_or_else(|e: PoisonError<_>| {
            tracing::error!("job registry mutex poisoned, recovering");
            e.into_inner()
        })
    }
}
