// crates/server/src/config.rs
//! Server configuration from command-line flags and environment variables.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Default port for the server.
pub const DEFAULT_PORT: u16 = 3130;

/// Default request body limit (one chunk plus multipart overhead).
pub const DEFAULT_MAX_BODY_BYTES: usize = 12 * 1024 * 1024;

/// Chunked-upload letter-frequency analysis server.
#[derive(Debug, Clone, Parser)]
#[command(name = "letterscope", version, about)]
pub struct ServerConfig {
    /// Address to bind.
    #[arg(long, env = "LETTERSCOPE_HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Port to listen on.
    #[arg(long, env = "LETTERSCOPE_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Directory receiving reassembled uploads.
    #[arg(long, env = "LETTERSCOPE_UPLOAD_DIR", default_value = "./uploads")]
    pub upload_dir: PathBuf,

    /// Deadline for text extraction, in seconds.
    #[arg(long, env = "LETTERSCOPE_EXTRACT_TIMEOUT_SECS", default_value_t = 10)]
    pub extract_timeout_secs: u64,

    /// Interval between progress frames, in milliseconds.
    #[arg(long, env = "LETTERSCOPE_POLL_INTERVAL_MS", default_value_t = 1000)]
    pub poll_interval_ms: u64,

    /// Maximum request body size for a chunk upload.
    #[arg(long, env = "LETTERSCOPE_MAX_BODY_BYTES", default_value_t = DEFAULT_MAX_BODY_BYTES)]
    pub max_body_bytes: usize,

    /// Seconds an unfinished or finished upload session is remembered
    /// without receiving a chunk.
    #[arg(long, env = "LETTERSCOPE_UPLOAD_SESSION_TIMEOUT_SECS", default_value_t = 600)]
    pub upload_session_timeout_secs: u64,

    /// Jobs allowed to run at once (0 = unbounded). Defaults to the CPU count.
    #[arg(long, env = "LETTERSCOPE_MAX_CONCURRENT_JOBS")]
    pub max_concurrent_jobs: Option<usize>,

    /// Single origin allowed by CORS. Any origin when unset.
    #[arg(long, env = "LETTERSCOPE_ALLOWED_ORIGIN")]
    pub allowed_origin: Option<String>,
}

impl ServerConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn extract_timeout(&self) -> Duration {
        Duration::from_secs(self.extract_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn upload_session_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_session_timeout_secs)
    }

    pub fn max_concurrent_jobs(&self) -> usize {
        self.max_concurrent_jobs.unwrap_or_else(num_cpus::get)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            upload_dir: PathBuf::from("./uploads"),
            extract_timeout_secs: 10,
            poll_interval_ms: 1000,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            upload_session_timeout_secs: 600,
            max_concurrent_jobs: None,
            allowed_origin: None,
        }
    }
}
