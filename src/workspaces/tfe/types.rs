use serde::{Deserialize, Serialize};

use crate::terraform::StateVersionPayload;
use crate::workspaces::{OAuthClient, StateVersion, Workspace, WorkspaceRequest};

pub const JSON_API_CONTENT_TYPE: &str = "application/vnd.api+json";

/// Top-level JSON:API document.
#[derive(Debug, Serialize, Deserialize)]
pub struct Document<T> {
    pub data: T,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDocument {
    #[serde(default)]
    pub errors: Vec<ApiError>,
}

#[derive(Debug, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

impl ErrorDocument {
    pub fn first_message(&self) -> Option<String> {
        let first = self.errors.first()?;
        match (&first.title, &first.detail) {
            (Some(title), Some(detail)) => Some(format!("{}: {}", title, detail)),
            (None, Some(detail)) => Some(detail.clone()),
            (Some(title), None) => Some(title.clone()),
            (None, None) => first.status.clone(),
        }
    }
}

/// Resource object sent on create.
#[derive(Debug, Serialize)]
pub struct NewResource<A> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub attributes: A,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct NewWorkspaceAttributes<'a> {
    pub name: &'a str,
    pub terraform_version: &'a str,
    pub working_directory: &'a str,
    pub vcs_repo: NewVcsRepo<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct NewVcsRepo<'a> {
    pub identifier: &'a str,
    pub oauth_token_id: &'a str,
    pub branch: &'a str,
    pub default_branch: bool,
}

pub fn workspace_document(
    request: &WorkspaceRequest,
) -> Document<NewResource<NewWorkspaceAttributes<'_>>> {
    Document {
        data: NewResource {
            kind: "workspaces",
            attributes: NewWorkspaceAttributes {
                name: &request.name,
                terraform_version: &request.terraform_version,
                working_directory: &request.working_directory,
                vcs_repo: NewVcsRepo {
                    identifier: &request.vcs_repo.identifier,
                    oauth_token_id: &request.vcs_repo.oauth_token_id,
                    branch: &request.vcs_repo.branch,
                    default_branch: request.vcs_repo.default_branch(),
                },
            },
        },
    }
}

pub fn state_version_document(
    payload: &StateVersionPayload,
) -> Document<NewResource<&StateVersionPayload>> {
    Document {
        data: NewResource {
            kind: "state-versions",
            attributes: payload,
        },
    }
}

#[derive(Debug, Serialize)]
pub struct LockRequest<'a> {
    pub reason: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct WorkspaceData {
    pub id: String,
    pub attributes: WorkspaceAttributes,
}

#[derive(Debug, Deserialize)]
pub struct WorkspaceAttributes {
    pub name: String,
}

impl From<WorkspaceData> for Workspace {
    fn from(data: WorkspaceData) -> Self {
        Workspace {
            id: data.id,
            name: data.attributes.name,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StateVersionData {
    pub id: String,
    pub attributes: StateVersionAttributes,
}

#[derive(Debug, Deserialize)]
pub struct StateVersionAttributes {
    pub serial: u64,
}

impl From<StateVersionData> for StateVersion {
    fn from(data: StateVersionData) -> Self {
        StateVersion {
            id: data.id,
            serial: data.attributes.serial,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ResourceRef {
    pub id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct RelationshipList {
    #[serde(default)]
    pub data: Vec<ResourceRef>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OAuthClientAttributes {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OAuthClientRelationships {
    #[serde(default)]
    pub oauth_tokens: RelationshipList,
}

#[derive(Debug, Deserialize)]
pub struct OAuthClientData {
    pub id: String,
    #[serde(default)]
    pub attributes: OAuthClientAttributes,
    #[serde(default)]
    pub relationships: OAuthClientRelationships,
}

impl From<OAuthClientData> for OAuthClient {
    fn from(data: OAuthClientData) -> Self {
        OAuthClient {
            id: data.id,
            name: data.attributes.name,
            token_ids: data
                .relationships
                .oauth_tokens
                .data
                .into_iter()
                .map(|r| r.id)
                .collect(),
        }
    }
}
