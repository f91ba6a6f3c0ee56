pub mod gcs;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

pub const DEFAULT_STATEFILES_DIR: &str = "statefiles";

/// Errors from the object store or from writing the downloaded blob locally.
///
/// SECURITY: Error messages must NEVER contain access tokens.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object not found: gs://{bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("permission denied for gs://{bucket}/{key}: {message}")]
    PermissionDenied {
        bucket: String,
        key: String,
        message: String,
    },

    #[error("storage API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("failed to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    fn name(&self) -> &str;

    /// Lists every object key in the bucket.
    async fn list_objects(&self, bucket: &str) -> Result<Vec<String>, StorageError>;

    /// Downloads one object to `dest`, overwriting it. Returns the byte count.
    async fn download_to_file(
        &self,
        bucket: &str,
        key: &str,
        dest: &Path,
    ) -> Result<u64, StorageError>;
}

/// Local download path for a blob: its final path segment under `dir`.
pub fn local_statefile_path(dir: &Path, blob_path: &str) -> PathBuf {
    let file_name = blob_path.rsplit('/').next().unwrap_or(blob_path);
    dir.join(file_name)
}
