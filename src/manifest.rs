use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_MANIFEST_PATH: &str = "migration.json";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed manifest '{}': {source}", path.display())]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// One manifest entry: a source blob and the workspace it should populate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MigrationTarget {
    pub gcs_blob_path: String,
    pub workspace_name: String,
    pub tf_version: String,
    pub working_dir: String,
    pub repo: String,
    pub branch: String,

    /// Set by the fetch phase once the blob is on disk.
    #[serde(skip)]
    pub statefile_local_path: Option<PathBuf>,

    /// Set once the workspace has been created or looked up.
    #[serde(skip)]
    pub workspace_id: Option<String>,
}

pub fn load_manifest(path: &Path) -> Result<Vec<MigrationTarget>, ManifestError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    parse_manifest(&raw).map_err(|source| ManifestError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

pub fn parse_manifest(raw: &str) -> Result<Vec<MigrationTarget>, serde_json::Error> {
    serde_json::from_str(raw)
}
