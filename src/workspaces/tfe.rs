mod client;
mod error;
mod types;

pub use client::{TFC_DEFAULT_URL, TfeClient};
pub use error::TfeError;

use async_trait::async_trait;

use super::{
    ApiVariant, StateVersion, Workspace, WorkspaceApi, WorkspaceError, WorkspaceRequest,
    resolve_oauth_token,
};
use crate::terraform::StateVersionPayload;

/// Where the OAuth token id that binds workspaces to VCS comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum VcsTokenSource {
    /// A token id given in configuration, used as is.
    Configured(String),
    /// Looked up from the organization's OAuth clients, optionally narrowed
    /// to one client by id or name.
    Lookup { client: Option<String> },
}

/// `WorkspaceApi` over the TFC/TFE v2 API.
///
/// Terraform Cloud always uses a configured token id. Terraform Enterprise
/// uses one when given and otherwise looks it up.
pub struct TfeWorkspaces {
    client: TfeClient,
    variant: ApiVariant,
    vcs_token: VcsTokenSource,
}

impl TfeWorkspaces {
    pub fn new(client: TfeClient, variant: ApiVariant, vcs_token: VcsTokenSource) -> Self {
        Self {
            client,
            variant,
            vcs_token,
        }
    }

    pub fn cloud(client: TfeClient, oauth_token_id: String) -> Self {
        Self::new(
            client,
            ApiVariant::Cloud,
            VcsTokenSource::Configured(oauth_token_id),
        )
    }

    pub fn enterprise(client: TfeClient, oauth_client: Option<String>) -> Self {
        Self::new(
            client,
            ApiVariant::Enterprise,
            VcsTokenSource::Lookup {
                client: oauth_client,
            },
        )
    }

    pub fn vcs_token(&self) -> &VcsTokenSource {
        &self.vcs_token
    }
}

#[async_trait]
impl WorkspaceApi for TfeWorkspaces {
    fn variant(&self) -> ApiVariant {
        self.variant
    }

    fn organization(&self) -> &str {
        self.client.organization()
    }

    async fn select_organization(&self) -> Result<(), WorkspaceError> {
        Ok(self.client.get_organization().await?)
    }

    async fn resolve_vcs_token_id(&self) -> Result<String, WorkspaceError> {
        match &self.vcs_token {
            VcsTokenSource::Configured(token_id) => Ok(token_id.clone()),
            VcsTokenSource::Lookup { client } => {
                let clients = self.client.list_oauth_clients().await?;
                tracing::debug!(count = clients.len(), "OAuth clients listed");

                let token_id = resolve_oauth_token(&clients, client.as_deref())?;
                tracing::info!(oauth_token_id = %token_id, "VCS OAuth token resolved");
                Ok(token_id)
            }
        }
    }

    async fn find_workspace(&self, name: &str) -> Result<Option<Workspace>, WorkspaceError> {
        Ok(self.client.show_workspace(name).await?)
    }

    async fn create_workspace(
        &self,
        request: &WorkspaceRequest,
    ) -> Result<Workspace, WorkspaceError> {
        Ok(self.client.create_workspace(request).await?)
    }

    async fn has_state(&self, workspace_id: &str) -> Result<bool, WorkspaceError> {
        Ok(self
            .client
            .current_state_version(workspace_id)
            .await?
            .is_some())
    }

    async fn lock_workspace(
        &self,
        workspace_id: &str,
        reason: &str,
    ) -> Result<(), WorkspaceError> {
        Ok(self.client.lock(workspace_id, reason).await?)
    }

    async fn create_state_version(
        &self,
        workspace_id: &str,
        payload: &StateVersionPayload,
    ) -> Result<StateVersion, WorkspaceError> {
        Ok(self.client.create_state_version(workspace_id, payload).await?)
    }

    async fn unlock_workspace(&self, workspace_id: &str) -> Result<(), WorkspaceError> {
        Ok(self.client.unlock(workspace_id).await?)
    }
}
