pub mod tfe;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::TfeConfig;
use crate::manifest::MigrationTarget;
use crate::terraform::StateVersionPayload;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("missing configuration: {0}")]
    MissingConfig(String),
    #[error("VCS OAuth token resolution failed: {0}")]
    VcsToken(String),
    #[error("terraform API error: {0}")]
    Tfe(String),
}

/// Which flavour of the workspace API to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ApiVariant {
    /// Terraform Cloud (multi-tenant): the OAuth token id is configured.
    Cloud,
    /// Terraform Enterprise (single-tenant): the OAuth token id is looked up.
    Enterprise,
}

impl std::fmt::Display for ApiVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiVariant::Cloud => f.write_str("cloud"),
            ApiVariant::Enterprise => f.write_str("enterprise"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Workspace {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StateVersion {
    pub id: String,
    pub serial: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VcsRepo {
    pub identifier: String,
    pub oauth_token_id: String,
    pub branch: String,
}

impl VcsRepo {
    /// Migrated workspaces always track the repository's default branch.
    pub fn default_branch(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkspaceRequest {
    pub name: String,
    pub terraform_version: String,
    pub working_directory: String,
    pub vcs_repo: VcsRepo,
}

impl WorkspaceRequest {
    pub fn for_target(target: &MigrationTarget, oauth_token_id: &str) -> Self {
        Self {
            name: target.workspace_name.clone(),
            terraform_version: target.tf_version.clone(),
            working_directory: target.working_dir.clone(),
            vcs_repo: VcsRepo {
                identifier: target.repo.clone(),
                oauth_token_id: oauth_token_id.to_string(),
                branch: target.branch.clone(),
            },
        }
    }
}

/// A VCS connection of the organization and the OAuth tokens under it.
#[derive(Debug, Clone, PartialEq)]
pub struct OAuthClient {
    pub id: String,
    pub name: Option<String>,
    pub token_ids: Vec<String>,
}

impl OAuthClient {
    fn matches(&self, selector: &str) -> bool {
        self.id == selector || self.name.as_deref() == Some(selector)
    }

    fn label(&self) -> String {
        match &self.name {
            Some(name) => format!("{} ({})", self.id, name),
            None => self.id.clone(),
        }
    }
}

/// Picks the OAuth token used to bind workspaces to VCS.
///
/// With a `selector` (client id or name) that client is used. Without one the
/// organization must have exactly one OAuth client. Either way the chosen
/// client must carry exactly one token.
pub fn resolve_oauth_token(
    clients: &[OAuthClient],
    selector: Option<&str>,
) -> Result<String, WorkspaceError> {
    let client = match selector {
        Some(selector) => clients.iter().find(|c| c.matches(selector)).ok_or_else(|| {
            WorkspaceError::VcsToken(format!(
                "no OAuth client matches '{}' (available: {})",
                selector,
                labels(clients)
            ))
        })?,
        None => match clients {
            [] => {
                return Err(WorkspaceError::VcsToken(
                    "organization has no OAuth clients".to_string(),
                ));
            }
            [only] => only,
            many => {
                return Err(WorkspaceError::VcsToken(format!(
                    "organization has {} OAuth clients, select one with TFC_OAUTH_CLIENT_ID: {}",
                    many.len(),
                    labels(many)
                )));
            }
        },
    };

    match client.token_ids.as_slice() {
        [] => Err(WorkspaceError::VcsToken(format!(
            "OAuth client {} has no tokens",
            client.label()
        ))),
        [token] => Ok(token.clone()),
        many => Err(WorkspaceError::VcsToken(format!(
            "OAuth client {} has {} tokens ({}), set TFC_OAUTH_TOKEN_ID explicitly",
            client.label(),
            many.len(),
            many.join(", ")
        ))),
    }
}

fn labels(clients: &[OAuthClient]) -> String {
    if clients.is_empty() {
        return "none".to_string();
    }
    clients
        .iter()
        .map(OAuthClient::label)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Operations the migration needs from a TFC/TFE organization.
#[async_trait]
pub trait WorkspaceApi: Send + Sync {
    fn variant(&self) -> ApiVariant;
    fn organization(&self) -> &str;

    /// Confirms the organization exists and the token can see it.
    async fn select_organization(&self) -> Result<(), WorkspaceError>;
    async fn resolve_vcs_token_id(&self) -> Result<String, WorkspaceError>;
    async fn find_workspace(&self, name: &str) -> Result<Option<Workspace>, WorkspaceError>;
    async fn create_workspace(
        &self,
        request: &WorkspaceRequest,
    ) -> Result<Workspace, WorkspaceError>;
    /// True when the workspace already has a current state version.
    async fn has_state(&self, workspace_id: &str) -> Result<bool, WorkspaceError>;
    async fn lock_workspace(
        &self,
        workspace_id: &str,
        reason: &str,
    ) -> Result<(), WorkspaceError>;
    async fn create_state_version(
        &self,
        workspace_id: &str,
        payload: &StateVersionPayload,
    ) -> Result<StateVersion, WorkspaceError>;
    async fn unlock_workspace(&self, workspace_id: &str) -> Result<(), WorkspaceError>;
}

pub fn connect(config: &TfeConfig) -> Result<Box<dyn WorkspaceApi>, WorkspaceError> {
    let client = tfe::TfeClient::with_base_url(
        config.token.clone(),
        config.base_url.clone(),
        config.organization.clone(),
    )?;

    let vcs_token = match (config.variant, config.oauth_token_id.clone()) {
        (_, Some(token_id)) => tfe::VcsTokenSource::Configured(token_id),
        (ApiVariant::Cloud, None) => {
            return Err(WorkspaceError::MissingConfig(
                "TFC_OAUTH_TOKEN_ID is required for the cloud API variant".to_string(),
            ));
        }
        (ApiVariant::Enterprise, None) => tfe::VcsTokenSource::Lookup {
            client: config.oauth_client.clone(),
        },
    };

    Ok(Box::new(tfe::TfeWorkspaces::new(
        client,
        config.variant,
        vcs_token,
    )))
}
