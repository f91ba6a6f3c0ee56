use std::path::PathBuf;

use crate::cli::Cli;
use crate::error::MigrateError;
use crate::workspaces::ApiVariant;

/// Policy for targets whose workspace name already exists in the organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExistingWorkspaces {
    /// Always create; a duplicate name fails the run.
    Fail,
    /// Reuse the existing workspace and skip the upload if it already has state.
    Reuse,
}

impl std::fmt::Display for ExistingWorkspaces {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExistingWorkspaces::Fail => f.write_str("fail"),
            ExistingWorkspaces::Reuse => f.write_str("reuse"),
        }
    }
}

#[derive(Clone)]
pub struct TfeConfig {
    pub token: String,
    pub base_url: String,
    pub organization: String,
    pub variant: ApiVariant,
    pub oauth_token_id: Option<String>,
    pub oauth_client: Option<String>,
}

#[derive(Clone)]
pub struct StorageConfig {
    pub bucket: String,
    pub token: Option<String>,
    pub base_url: String,
}

/// Settings resolved once at startup and shared read-only by every phase.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    pub manifest_path: PathBuf,
    pub statefiles_dir: PathBuf,
    pub storage: StorageConfig,
    /// `None` for dry runs, which never contact the workspace API.
    pub tfe: Option<TfeConfig>,
    pub existing: ExistingWorkspaces,
}

impl MigrationConfig {
    pub fn from_cli(cli: Cli) -> Result<Self, MigrateError> {
        let bucket = required(cli.bucket, "GCS_BUCKET_NAME")?;

        let tfe = if cli.dry_run {
            None
        } else {
            Some(TfeConfig {
                token: required(cli.tfc_token, "TFC_TOKEN")?,
                base_url: cli.tfc_url,
                organization: required(cli.organization, "TFC_ORG")?,
                variant: cli.api,
                oauth_token_id: non_empty(cli.oauth_token_id),
                oauth_client: non_empty(cli.oauth_client),
            })
        };

        Ok(Self {
            manifest_path: cli.manifest,
            statefiles_dir: cli.statefiles_dir,
            storage: StorageConfig {
                bucket,
                token: non_empty(cli.gcs_token),
                base_url: cli.gcs_url,
            },
            tfe,
            existing: cli.existing,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn required(value: Option<String>, name: &str) -> Result<String, MigrateError> {
    non_empty(value).ok_or_else(|| MigrateError::Config(format!("{} is not set", name)))
}

impl std::fmt::Debug for TfeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TfeConfig")
            .field("token", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("organization", &self.organization)
            .field("variant", &self.variant)
            .field("oauth_token_id", &self.oauth_token_id)
            .field("oauth_client", &self.oauth_client)
            .finish()
    }
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("bucket", &self.bucket)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .finish()
    }
}
