// crates/server-jobs/src/lib.rs
//! Job lifecycle and concurrency engine.
//!
//! Provides:
//! - `JobRegistry` - mutex-guarded arena of job state
//! - `extract_with_deadline` - timeout-bounded, panic-isolated text extraction
//! - `JobRunner` - one background task per completed upload
//! - `progress_frames` - per-subscriber polling stream of `StatusFrame`s

pub mod notifier;
pub mod pipeline;
pub mod registry;
pub mod runner;

pub use notifier::{progress_frames, StatusFrame, DEFAULT_POLL_INTERVAL, JOB_NOT_FOUND};
pub use pipeline::{extract_with_deadline, DEFAULT_EXTRACT_TIMEOUT};
pub use registry::JobRegistry;
pub use runner::{JobRunner, RunnerConfig};
