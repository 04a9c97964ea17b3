// crates/core/src/error.rs
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a format decoder while turning bytes into text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unsupported file type: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("failed to decode {format} content: {message}")]
    Malformed { format: String, message: String },

    #[error("extraction cancelled")]
    Cancelled,
}

impl DecodeError {
    pub fn malformed(format: impl Into<String>, message: impl ToString) -> Self {
        Self::Malformed {
            format: format.into(),
            message: message.to_string(),
        }
    }
}

/// Errors surfaced by the deadline-bounded extraction pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("unsupported file type: {extension}")]
    Unsupported { extension: String },

    #[error("malformed input: {message}")]
    Malformed { message: String },

    #[error("text extraction timed out after {}s", .after.as_secs_f64())]
    Timeout { after: Duration },
}

impl From<DecodeError> for ExtractionError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::UnsupportedFormat { extension } => Self::Unsupported { extension },
            DecodeError::Malformed { .. } => Self::Malformed {
                message: err.to_string(),
            },
            // Only produced after the deadline fired and cancelled the decoder.
            DecodeError::Cancelled => Self::Malformed {
                message: "extractor stopped after cancellation".to_string(),
            },
        }
    }
}

/// Errors from the on-disk upload store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid file name: {name:?}")]
    InvalidFileName { name: String },

    #[error("permission denied writing {path}")]
    PermissionDenied { path: PathBuf },

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            _ => Self::Io { path, source },
        }
    }
}

/// Errors from the job registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("job already exists: {0}")]
    AlreadyExists(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_display() {
        let err = DecodeError::UnsupportedFormat {
            extension: ".exe".into(),
        };
        assert_eq!(err.to_string(), "unsupported file type: .exe");

        let err = DecodeError::malformed("pdf", "bad xref table");
        assert!(err.to_string().contains("pdf"));
        assert!(err.to_string().contains("bad xref table"));
    }

    #[test]
    fn test_extraction_error_from_decode_error() {
        let err: ExtractionError = DecodeError::UnsupportedFormat {
            extension: ".exe".into(),
        }
        .into();
        assert_eq!(
            err,
            ExtractionError::Unsupported {
                extension: ".exe".into()
            }
        );

        let err: ExtractionError = DecodeError::malformed("docx", "zip error").into();
        assert!(matches!(err, ExtractionError::Malformed { ref message } if message.contains("zip error")));

        let err: ExtractionError = DecodeError::Cancelled.into();
        assert!(matches!(err, ExtractionError::Malformed { .. }));
    }

    #[test]
    fn test_timeout_display() {
        let err = ExtractionError::Timeout {
            after: Duration::from_secs(10),
        };
        assert_eq!(err.to_string(), "text extraction timed out after 10s");
    }

    #[test]
    fn test_storage_error_io_classification() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = StorageError::io("/uploads/a.txt", io_err);
        assert!(matches!(err, StorageError::PermissionDenied { .. }));

        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err = StorageError::io("/uploads/a.txt", io_err);
        assert!(matches!(err, StorageError::Io { .. }));
        assert!(err.to_string().contains("disk full"));
    }
}
