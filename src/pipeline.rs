//! The migration workflow: fetch every blob, then provision and upload each target.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::config::ExistingWorkspaces;
use crate::error::{MigrateError, MigrationStep};
use crate::manifest::MigrationTarget;
use crate::storage::{ObjectStore, local_statefile_path};
use crate::terraform::StateVersionPayload;
use crate::workspaces::{StateVersion, Workspace, WorkspaceApi, WorkspaceRequest};

pub const LOCK_REASON: &str = "migration script";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    Migrated,
    /// Workspace was reused and already had state, so nothing was uploaded.
    SkippedExistingState,
}

impl std::fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutcomeStatus::Migrated => f.write_str("migrated"),
            OutcomeStatus::SkippedExistingState => f.write_str("skipped (has state)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TargetOutcome {
    pub workspace_name: String,
    pub workspace_id: String,
    pub statefile: PathBuf,
    pub md5: Option<String>,
    pub status: OutcomeStatus,
}

/// Result of a run: the targets that completed and, if the run stopped early,
/// the error that stopped it.
#[derive(Debug, Default)]
pub struct MigrationReport {
    pub outcomes: Vec<TargetOutcome>,
    pub failure: Option<MigrateError>,
}

impl MigrationReport {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    pub fn failed_step(&self) -> Option<MigrationStep> {
        self.failure.as_ref().and_then(MigrateError::step)
    }

    pub fn into_result(self) -> Result<Vec<TargetOutcome>, MigrateError> {
        match self.failure {
            Some(err) => Err(err),
            None => Ok(self.outcomes),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanEntry {
    pub workspace_name: String,
    pub blob_path: String,
    pub statefile: PathBuf,
    pub blob_exists: bool,
}

pub struct Migrator<'a> {
    store: &'a dyn ObjectStore,
    bucket: &'a str,
    statefiles_dir: &'a Path,
    existing: ExistingWorkspaces,
}

impl<'a> Migrator<'a> {
    pub fn new(
        store: &'a dyn ObjectStore,
        bucket: &'a str,
        statefiles_dir: &'a Path,
        existing: ExistingWorkspaces,
    ) -> Self {
        Self {
            store,
            bucket,
            statefiles_dir,
            existing,
        }
    }

    /// Checks which blobs exist without downloading or touching any workspace.
    pub async fn plan(&self, targets: &[MigrationTarget]) -> Result<Vec<PlanEntry>, MigrateError> {
        check_distinct_statefiles(self.statefiles_dir, targets)?;

        let objects: HashSet<String> = self
            .store
            .list_objects(self.bucket)
            .await?
            .into_iter()
            .collect();
        tracing::info!(bucket = %self.bucket, objects = objects.len(), "bucket listed");

        Ok(targets
            .iter()
            .map(|target| PlanEntry {
                workspace_name: target.workspace_name.clone(),
                blob_path: target.gcs_blob_path.clone(),
                statefile: local_statefile_path(self.statefiles_dir, &target.gcs_blob_path),
                blob_exists: objects.contains(&target.gcs_blob_path),
            })
            .collect())
    }

    /// Runs the whole migration, stopping at the first failing target.
    ///
    /// Errors that aren't tied to a target (organization lookup, VCS token
    /// resolution) are returned directly; target failures are recorded in the
    /// report alongside the targets that completed before them.
    pub async fn run(
        &self,
        api: &dyn WorkspaceApi,
        mut targets: Vec<MigrationTarget>,
    ) -> Result<MigrationReport, MigrateError> {
        api.select_organization().await?;
        tracing::info!(
            organization = %api.organization(),
            api = %api.variant(),
            targets = targets.len(),
            "organization selected"
        );

        let mut report = MigrationReport::default();
        if targets.is_empty() {
            return Ok(report);
        }

        if let Err(err) = self.fetch_all(&mut targets).await {
            report.failure = Some(err);
            return Ok(report);
        }

        let oauth_token_id = api.resolve_vcs_token_id().await?;

        for target in &mut targets {
            match self.migrate_target(api, target, &oauth_token_id).await {
                Ok(outcome) => report.outcomes.push(outcome),
                Err(err) => {
                    tracing::error!(
                        workspace = %target.workspace_name,
                        error = %err,
                        "target failed"
                    );
                    report.failure = Some(err);
                    break;
                }
            }
        }

        Ok(report)
    }

    /// Downloads every target's blob and records where it landed.
    pub async fn fetch_all(&self, targets: &mut [MigrationTarget]) -> Result<(), MigrateError> {
        check_distinct_statefiles(self.statefiles_dir, targets)?;
        let mut fetched: HashSet<String> = HashSet::new();

        for target in targets.iter_mut() {
            let dest = local_statefile_path(self.statefiles_dir, &target.gcs_blob_path);
            if !fetched.insert(target.gcs_blob_path.clone()) {
                tracing::debug!(
                    workspace = %target.workspace_name,
                    blob = %target.gcs_blob_path,
                    "statefile already downloaded"
                );
                target.statefile_local_path = Some(dest);
                continue;
            }

            let bytes = self
                .store
                .download_to_file(self.bucket, &target.gcs_blob_path, &dest)
                .await
                .map_err(|e| {
                    MigrateError::at_step(&target.workspace_name, MigrationStep::Download, e)
                })?;

            tracing::info!(
                store = self.store.name(),
                workspace = %target.workspace_name,
                blob = %target.gcs_blob_path,
                path = %dest.display(),
                bytes,
                "statefile downloaded"
            );
            target.statefile_local_path = Some(dest);
        }

        Ok(())
    }

    async fn migrate_target(
        &self,
        api: &dyn WorkspaceApi,
        target: &mut MigrationTarget,
        oauth_token_id: &str,
    ) -> Result<TargetOutcome, MigrateError> {
        let name = target.workspace_name.clone();
        let statefile = target.statefile_local_path.clone().ok_or_else(|| {
            MigrateError::at_step(
                &name,
                MigrationStep::ReadState,
                MigrateError::Config("statefile was not downloaded".to_string()),
            )
        })?;

        let (workspace, reused) = self.provision(api, target, oauth_token_id).await?;
        target.workspace_id = Some(workspace.id.clone());

        if reused {
            let has_state = api
                .has_state(&workspace.id)
                .await
                .map_err(|e| MigrateError::at_step(&name, MigrationStep::LookupWorkspace, e))?;
            if has_state {
                tracing::warn!(
                    workspace = %name,
                    workspace_id = %workspace.id,
                    "workspace already has state, skipping upload"
                );
                return Ok(TargetOutcome {
                    workspace_name: name,
                    workspace_id: workspace.id,
                    statefile,
                    md5: None,
                    status: OutcomeStatus::SkippedExistingState,
                });
            }
        }

        let raw = tokio::fs::read(&statefile)
            .await
            .map_err(|e| MigrateError::at_step(&name, MigrationStep::ReadState, e))?;
        let payload = StateVersionPayload::from_bytes(&raw);
        tracing::debug!(
            workspace = %name,
            bytes = raw.len(),
            encoded_bytes = payload.encoded_len(),
            "state payload built"
        );

        let version = upload_locked(api, &name, &workspace.id, &payload).await?;
        tracing::info!(
            workspace = %name,
            workspace_id = %workspace.id,
            state_version = %version.id,
            serial = version.serial,
            md5 = %payload.md5,
            "state version created"
        );

        Ok(TargetOutcome {
            workspace_name: name,
            workspace_id: workspace.id,
            statefile,
            md5: Some(payload.md5),
            status: OutcomeStatus::Migrated,
        })
    }

    /// Creates the target's workspace, or reuses it under `ExistingWorkspaces::Reuse`.
    async fn provision(
        &self,
        api: &dyn WorkspaceApi,
        target: &MigrationTarget,
        oauth_token_id: &str,
    ) -> Result<(Workspace, bool), MigrateError> {
        let name = &target.workspace_name;

        if self.existing == ExistingWorkspaces::Reuse {
            let found = api
                .find_workspace(name)
                .await
                .map_err(|e| MigrateError::at_step(name, MigrationStep::LookupWorkspace, e))?;
            if let Some(workspace) = found {
                tracing::info!(
                    workspace = %name,
                    workspace_id = %workspace.id,
                    "reusing workspace"
                );
                return Ok((workspace, true));
            }
        }

        let request = WorkspaceRequest::for_target(target, oauth_token_id);
        let workspace = api
            .create_workspace(&request)
            .await
            .map_err(|e| MigrateError::at_step(name, MigrationStep::CreateWorkspace, e))?;
        tracing::info!(workspace = %name, workspace_id = %workspace.id, "workspace created");

        Ok((workspace, false))
    }
}

/// Creates a state version inside a lock bracket.
///
/// Once the lock is held the workspace is always unlocked, whether or not the
/// state version was created. A creation error wins over an unlock error.
pub async fn upload_locked(
    api: &dyn WorkspaceApi,
    name: &str,
    workspace_id: &str,
    payload: &StateVersionPayload,
) -> Result<StateVersion, MigrateError> {
    api.lock_workspace(workspace_id, LOCK_REASON)
        .await
        .map_err(|e| MigrateError::at_step(name, MigrationStep::Lock, e))?;
    tracing::debug!(workspace = %name, workspace_id, "workspace locked");

    let created = api.create_state_version(workspace_id, payload).await;
    let unlocked = api.unlock_workspace(workspace_id).await;

    match (created, unlocked) {
        (Ok(version), Ok(())) => {
            tracing::debug!(workspace = %name, workspace_id, "workspace unlocked");
            Ok(version)
        }
        (Ok(_), Err(e)) => Err(MigrateError::at_step(name, MigrationStep::Unlock, e)),
        (Err(e), unlocked) => {
            if let Err(unlock_err) = unlocked {
                tracing::error!(
                    workspace = %name,
                    workspace_id,
                    error = %unlock_err,
                    "workspace left locked"
                );
            }
            Err(MigrateError::at_step(name, MigrationStep::CreateStateVersion, e))
        }
    }
}

// Different blobs sharing a basename would overwrite each other in the scratch
// directory. Targets naming the same blob share one download.
fn check_distinct_statefiles(dir: &Path, targets: &[MigrationTarget]) -> Result<(), MigrateError> {
    let mut seen: HashMap<PathBuf, &str> = HashMap::new();

    for target in targets {
        let path = local_statefile_path(dir, &target.gcs_blob_path);
        let previous = *seen.entry(path.clone()).or_insert(&target.gcs_blob_path);
        if previous != target.gcs_blob_path {
            return Err(MigrateError::Config(format!(
                "blobs '{}' and '{}' both download to '{}'",
                previous,
                target.gcs_blob_path,
                path.display()
            )));
        }
    }

    Ok(())
}
