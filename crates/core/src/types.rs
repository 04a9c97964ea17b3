// crates/core/src/types.rs
//! Job model shared by the registry, the pipeline and the transport layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of buckets in a [`LetterHistogram`], one per letter `a..=z`.
pub const ALPHABET_LEN: usize = 26;

/// Opaque job identifier: a random 128-bit token rendered as a UUID string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Case-insensitive count of each ASCII letter.
///
/// Serializes as a plain array of 26 integers, index 0 = `a`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LetterHistogram([u64; ALPHABET_LEN]);

impl LetterHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one byte. Uppercase ASCII folds to lowercase; anything that
    /// is not an ASCII letter is ignored.
    #[inline]
    pub fn record(&mut self, byte: u8) {
        let lower = byte.to_ascii_lowercase();
        if lower.is_ascii_lowercase() {
            self.0[(lower - b'a') as usize] += 1;
        }
    }

    /// Count for `letter` (either case). Non-letters return 0.
    pub fn count(&self, letter: char) -> u64 {
        let lower = letter.to_ascii_lowercase();
        if lower.is_ascii_lowercase() {
            self.0[(lower as u8 - b'a') as usize]
        } else {
            0
        }
    }

    pub fn total(&self) -> u64 {
        self.0.iter().sum()
    }

    pub fn as_array(&self) -> &[u64; ALPHABET_LEN] {
        &self.0
    }
}

/// Mutable state of one analysis job.
///
/// Transition methods enforce the lifecycle: progress never moves backwards,
/// and once the job reaches a terminal state every further mutation is a no-op.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Job {
    pub id: JobId,
    pub file_name: String,
    pub status: JobStatus,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<LetterHistogram>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// A freshly registered job: `Pending` at 0%.
    pub fn new(id: JobId, file_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            file_name: file_name.into(),
            status: JobStatus::Pending,
            progress: 0,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Pending -> Running.
    pub fn start(&mut self) -> bool {
        if self.status != JobStatus::Pending {
            return false;
        }
        self.status = JobStatus::Running;
        self.touch();
        true
    }

    /// Raise progress to `percent` (clamped to 99; only completion reports 100).
    /// Returns false when the update was ignored.
    pub fn advance(&mut self, percent: u8) -> bool {
        let percent = percent.min(99);
        if self.is_terminal() || percent <= self.progress {
            return false;
        }
        self.progress = percent;
        self.touch();
        true
    }

    /// Record the final histogram and finish at 100%.
    pub fn complete(&mut self, histogram: LetterHistogram) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.status = JobStatus::Completed;
        self.progress = 100;
        self.result = Some(histogram);
        self.touch();
        true
    }

    /// Record a failure and finish at 100% ("done trying").
    pub fn fail(&mut self, message: impl Into<String>) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.status = JobStatus::Failed;
        self.progress = 100;
        self.error = Some(message.into());
        self.touch();
        true
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_job_id_generate_is_unique_uuid() {
        let a = JobId::generate();
        let b = JobId::generate();
        assert_ne!(a, b);
        assert!(uuid::Uuid::parse_str(a.as_str()).is_ok());
    }

    #[test]
    fn test_histogram_folds_case_and_ignores_non_letters() {
        let mut h = LetterHistogram::new();
        for b in b"Hello World! 123 \xc3\xa9" {
            h.record(*b);
        }
        assert_eq!(h.count('h'), 1);
        assert_eq!(h.count('L'), 3);
        assert_eq!(h.count('o'), 2);
        assert_eq!(h.count('!'), 0);
        assert_eq!(h.total(), 10);
    }

    #[test]
    fn test_histogram_serializes_as_array() {
        let mut h = LetterHistogram::new();
        h.record(b'a');
        h.record(b'z');
        let json = serde_json::to_value(h).unwrap();
        let arr = json.as_array().unwrap();
        assert_eq!(arr.len(), ALPHABET_LEN);
        assert_eq!(arr[0], 1);
        assert_eq!(arr[25], 1);
    }

    #[test]
    fn test_job_lifecycle() {
        let mut job = Job::new(JobId::from("j1"), "a.txt");
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.progress, 0);

        assert!(job.start());
        assert!(!job.start());
        assert_eq!(job.status, JobStatus::Running);

        assert!(job.advance(40));
        assert!(!job.advance(30), "progress must not go backwards");
        assert_eq!(job.progress, 40);

        assert!(job.complete(LetterHistogram::new()));
        assert_eq!(job.progress, 100);
        assert!(job.result.is_some());
    }

    #[test]
    fn test_advance_never_reports_100_before_completion() {
        let mut job = Job::new(JobId::from("j2"), "a.txt");
        job.start();
        job.advance(100);
        assert_eq!(job.progress, 99);
        assert_eq!(job.status, JobStatus::Running);
    }

    #[test]
    fn test_terminal_job_is_frozen() {
        let mut job = Job::new(JobId::from("j3"), "a.exe");
        assert!(job.fail("unsupported file type: .exe"));
        let frozen = job.clone();

        assert!(!job.start());
        assert!(!job.advance(50));
        assert!(!job.complete(LetterHistogram::new()));
        assert!(!job.fail("again"));
        assert_eq!(job, frozen);
        assert_eq!(job.progress, 100);
        assert!(job.result.is_none());
    }

    #[test]
    fn test_job_status_serialization() {
        assert_eq!(serde_json::to_string(&JobStatus::Running).unwrap(), "\"running\"");
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Pending.is_terminal());
    }
}
