// crates/server/src/storage.rs
//! On-disk destination files for chunked uploads.

use std::path::{Path, PathBuf};

use letterscope_core::StorageError;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// Directory holding one destination file per upload, named after the
/// client-supplied file name.
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    /// Use `root` as the upload directory, creating it if missing.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| StorageError::io(&root, e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Destination path for `file_name`.
    ///
    /// The name must be a single plain path component; anything that could
    /// escape the upload directory is rejected.
    pub fn path_for(&self, file_name: &str) -> Result<PathBuf, StorageError> {
        let invalid = file_name.is_empty()
            || file_name == "."
            || file_name == ".."
            || file_name.contains(['/', '\\', '\0']);
        if invalid {
            return Err(StorageError::InvalidFileName {
                name: file_name.to_string(),
            });
        }
        Ok(self.root.join(file_name))
    }

    /// Create or truncate `path` and write the first chunk.
    pub async fn write_first(&self, path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
        self.write(path, bytes, true).await
    }

    /// Append a chunk to `path`, creating the file if needed.
    pub async fn append(&self, path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
        self.write(path, bytes, false).await
    }

    pub async fn read_all(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        tokio::fs::read(path)
            .await
            .map_err(|e| StorageError::io(path, e))
    }

    /// Whether `path` currently holds exactly `bytes`. Missing or unreadable
    /// files never match.
    pub async fn holds(&self, path: &Path, bytes: &[u8]) -> bool {
        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.len() == bytes.len() as u64 => {}
            _ => return false,
        }
        self.read_all(path).await.is_ok_and(|stored| stored == bytes)
    }

    async fn write(&self, path: &Path, bytes: &[u8], truncate: bool) -> Result<(), StorageError> {
        let mut options = OpenOptions::new();
        options.create(true);
        if truncate {
            options.write(true).truncate(true);
        } else {
            options.append(true);
        }
        let mut file = options
            .open(path)
            .await
            .map_err(|e| StorageError::io(path, e))?;
        file.write_all(bytes)
            .await
            .map_err(|e| StorageError::io(path, e))?;
        file.flush().await.map_err(|e| StorageError::io(path, e))
    }
}
