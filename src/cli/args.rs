use std::path::PathBuf;

use clap::Parser;

use crate::config::ExistingWorkspaces;
use crate::manifest::DEFAULT_MANIFEST_PATH;
use crate::storage::DEFAULT_STATEFILES_DIR;
use crate::storage::gcs::GCS_API_BASE;
use crate::workspaces::ApiVariant;
use crate::workspaces::tfe::TFC_DEFAULT_URL;

/// Migrate Terraform state files from a GCS bucket into TFC/TFE workspaces.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[arg(long, env = "TFC_TOKEN", hide_env_values = true)]
    pub tfc_token: Option<String>,

    #[arg(long, env = "TFC_URL", default_value = TFC_DEFAULT_URL)]
    pub tfc_url: String,

    #[arg(long = "org", env = "TFC_ORG")]
    pub organization: Option<String>,

    #[arg(long, value_enum, env = "TFC_API_VARIANT", default_value_t = ApiVariant::Cloud)]
    pub api: ApiVariant,

    #[arg(long, env = "TFC_OAUTH_TOKEN_ID")]
    pub oauth_token_id: Option<String>,

    /// OAuth client id or name to take the VCS token from (enterprise only)
    #[arg(long, env = "TFC_OAUTH_CLIENT_ID")]
    pub oauth_client: Option<String>,

    #[arg(long, env = "GCS_BUCKET_NAME")]
    pub bucket: Option<String>,

    #[arg(long, env = "GCS_ACCESS_TOKEN", hide_env_values = true)]
    pub gcs_token: Option<String>,

    #[arg(long, env = "GCS_URL", default_value = GCS_API_BASE)]
    pub gcs_url: String,

    #[arg(long, env = "MIGRATION_MANIFEST", default_value = DEFAULT_MANIFEST_PATH)]
    pub manifest: PathBuf,

    #[arg(long, env = "STATEFILES_DIR", default_value = DEFAULT_STATEFILES_DIR)]
    pub statefiles_dir: PathBuf,

    /// What to do when a workspace with the target name already exists
    #[arg(
        long,
        value_enum,
        env = "MIGRATION_EXISTING",
        default_value_t = ExistingWorkspaces::Fail
    )]
    pub existing: ExistingWorkspaces,

    /// Check the manifest against the bucket without downloading or creating anything
    #[arg(long)]
    pub dry_run: bool,
}
