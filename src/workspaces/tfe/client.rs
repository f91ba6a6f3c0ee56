use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::TfeError;
use super::types::{
    Document, ErrorDocument, JSON_API_CONTENT_TYPE, LockRequest, OAuthClientData,
    StateVersionData, WorkspaceData, state_version_document, workspace_document,
};
use crate::terraform::StateVersionPayload;
use crate::workspaces::{OAuthClient, StateVersion, Workspace, WorkspaceRequest};

pub const TFC_DEFAULT_URL: &str = "https://app.terraform.io";

/// HTTP client for the TFC/TFE v2 API, bound to one organization.
#[derive(Clone)]
pub struct TfeClient {
    client: reqwest::Client,
    base_url: String,
    organization: String,
}

impl TfeClient {
    pub fn new(token: String, organization: String) -> Result<Self, TfeError> {
        Self::with_base_url(token, TFC_DEFAULT_URL.to_string(), organization)
    }

    /// `base_url` is the host root (e.g. `https://tfe.example.com`), without `/api/v2`.
    pub fn with_base_url(
        token: String,
        base_url: String,
        organization: String,
    ) -> Result<Self, TfeError> {
        let mut headers = HeaderMap::new();
        let header_value =
            HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| TfeError::Auth {
                message: "Invalid token format".to_string(),
            })?;
        headers.insert(AUTHORIZATION, header_value);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(TfeError::Network)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            organization,
        })
    }

    pub fn api_base(&self) -> String {
        format!("{}/api/v2", self.base_url)
    }

    pub fn organization(&self) -> &str {
        &self.organization
    }

    fn org_url(&self, suffix: &str) -> String {
        format!(
            "{}/organizations/{}{}",
            self.api_base(),
            urlencoding::encode(&self.organization),
            suffix
        )
    }

    fn workspace_url(&self, workspace_id: &str, suffix: &str) -> String {
        format!(
            "{}/workspaces/{}{}",
            self.api_base(),
            urlencoding::encode(workspace_id),
            suffix
        )
    }

    pub async fn get_organization(&self) -> Result<(), TfeError> {
        let response = self.client.get(self.org_url("")).send().await?;
        match check(response).await {
            Err(TfeError::NotFound { .. }) => Err(TfeError::NotFound {
                message: format!("organization '{}'", self.organization),
            }),
            other => other.map(|_| ()),
        }
    }

    pub async fn list_oauth_clients(&self) -> Result<Vec<OAuthClient>, TfeError> {
        let response = self
            .client
            .get(self.org_url("/oauth-clients"))
            .send()
            .await?;
        let doc: Document<Vec<OAuthClientData>> = read_document(response).await?;
        Ok(doc.data.into_iter().map(Into::into).collect())
    }

    pub async fn show_workspace(&self, name: &str) -> Result<Option<Workspace>, TfeError> {
        let url = self.org_url(&format!("/workspaces/{}", urlencoding::encode(name)));
        let response = self.client.get(&url).send().await?;

        match read_document::<Document<WorkspaceData>>(response).await {
            Ok(doc) => Ok(Some(doc.data.into())),
            Err(TfeError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn create_workspace(
        &self,
        request: &WorkspaceRequest,
    ) -> Result<Workspace, TfeError> {
        let response = self
            .post(self.org_url("/workspaces"), &workspace_document(request))?
            .send()
            .await?;
        let doc: Document<WorkspaceData> = read_document(response).await?;
        Ok(doc.data.into())
    }

    pub async fn current_state_version(
        &self,
        workspace_id: &str,
    ) -> Result<Option<StateVersion>, TfeError> {
        let url = self.workspace_url(workspace_id, "/current-state-version");
        let response = self.client.get(&url).send().await?;

        match read_document::<Document<StateVersionData>>(response).await {
            Ok(doc) => Ok(Some(doc.data.into())),
            Err(TfeError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn lock(&self, workspace_id: &str, reason: &str) -> Result<(), TfeError> {
        let url = self.workspace_url(workspace_id, "/actions/lock");
        let response = self.post(url, &LockRequest { reason })?.send().await?;
        check(response).await.map(|_| ())
    }

    pub async fn unlock(&self, workspace_id: &str) -> Result<(), TfeError> {
        let url = self.workspace_url(workspace_id, "/actions/unlock");
        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, JSON_API_CONTENT_TYPE)
            .send()
            .await?;
        check(response).await.map(|_| ())
    }

    pub async fn create_state_version(
        &self,
        workspace_id: &str,
        payload: &StateVersionPayload,
    ) -> Result<StateVersion, TfeError> {
        let url = self.workspace_url(workspace_id, "/state-versions");
        let response = self
            .post(url, &state_version_document(payload))?
            .send()
            .await?;
        let doc: Document<StateVersionData> = read_document(response).await?;
        Ok(doc.data.into())
    }

    // NOTE: Serialized by hand so the JSON:API content type isn't replaced by `.json()`
    fn post<B: Serialize>(
        &self,
        url: String,
        body: &B,
    ) -> Result<reqwest::RequestBuilder, TfeError> {
        let bytes = serde_json::to_vec(body).map_err(|e| TfeError::Api {
            status: 0,
            message: format!("Failed to encode request: {}", e),
        })?;

        Ok(self
            .client
            .post(url)
            .header(CONTENT_TYPE, JSON_API_CONTENT_TYPE)
            .body(bytes))
    }
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, TfeError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<ErrorDocument>()
        .await
        .ok()
        .and_then(|doc| doc.first_message())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        });

    Err(match status {
        StatusCode::UNAUTHORIZED => TfeError::Auth { message },
        StatusCode::NOT_FOUND => TfeError::NotFound { message },
        StatusCode::CONFLICT | StatusCode::LOCKED => TfeError::Conflict { message },
        _ => TfeError::Api {
            status: status.as_u16(),
            message,
        },
    })
}

async fn read_document<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, TfeError> {
    let response = check(response).await?;
    let status = response.status();

    response.json::<T>().await.map_err(|e| TfeError::Api {
        status: status.as_u16(),
        message: format!("Failed to parse response: {}", e),
    })
}

impl std::fmt::Debug for TfeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TfeClient")
            .field("base_url", &self.base_url)
            .field("organization", &self.organization)
            .field("token", &"[REDACTED]")
            .finish()
    }
}
