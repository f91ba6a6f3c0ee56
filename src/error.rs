use thiserror::Error;

use crate::manifest::ManifestError;
use crate::storage::StorageError;
use crate::workspaces::WorkspaceError;

/// The step of a target's migration that an error occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationStep {
    Download,
    LookupWorkspace,
    CreateWorkspace,
    ReadState,
    Lock,
    CreateStateVersion,
    Unlock,
}

impl std::fmt::Display for MigrationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MigrationStep::Download => "download",
            MigrationStep::LookupWorkspace => "workspace lookup",
            MigrationStep::CreateWorkspace => "workspace creation",
            MigrationStep::ReadState => "statefile read",
            MigrationStep::Lock => "lock",
            MigrationStep::CreateStateVersion => "state version creation",
            MigrationStep::Unlock => "unlock",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{workspace}: {step} failed: {source}")]
    Step {
        workspace: String,
        step: MigrationStep,
        #[source]
        source: Box<MigrateError>,
    },
}

impl MigrateError {
    pub fn at_step(workspace: &str, step: MigrationStep, source: impl Into<MigrateError>) -> Self {
        MigrateError::Step {
            workspace: workspace.to_string(),
            step,
            source: Box::new(source.into()),
        }
    }

    /// The failing step, when the error is tied to one target.
    pub fn step(&self) -> Option<MigrationStep> {
        match self {
            MigrateError::Step { step, .. } => Some(*step),
            _ => None,
        }
    }
}
