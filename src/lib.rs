//! tfc-migrate - Terraform state migration into TFC/TFE
//!
//! Downloads Terraform state files from a GCS bucket and uploads each one as the
//! initial state version of a newly created VCS-backed workspace.

pub mod cli;
pub mod config;
pub mod error;
pub mod manifest;
pub mod output;
pub mod pipeline;
pub mod storage;
pub mod terraform;
pub mod workspaces;

pub use config::{ExistingWorkspaces, MigrationConfig};
pub use error::{MigrateError, MigrationStep};
pub use manifest::{MigrationTarget, load_manifest};
pub use pipeline::{MigrationReport, Migrator, OutcomeStatus, TargetOutcome};
pub use storage::gcs::GcsClient;
pub use storage::{ObjectStore, StorageError};
pub use terraform::StateVersionPayload;
pub use workspaces::tfe::{TfeClient, TfeError};
pub use workspaces::{ApiVariant, WorkspaceApi, WorkspaceError};
