use std::path::Path;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;

use super::{ObjectStore, StorageError};

pub const GCS_API_BASE: &str = "https://storage.googleapis.com";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectList {
    #[serde(default)]
    items: Vec<ObjectEntry>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObjectEntry {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
}

/// Client for the Cloud Storage JSON API.
#[derive(Clone)]
pub struct GcsClient {
    client: reqwest::Client,
    base_url: String,
}

impl GcsClient {
    /// `token` is an OAuth access token; `None` sends unauthenticated requests.
    pub fn new(token: Option<String>) -> Result<Self, StorageError> {
        Self::with_base_url(token, GCS_API_BASE.to_string())
    }

    /// NOTE: Primarily used for testing with mock servers.
    pub fn with_base_url(token: Option<String>, base_url: String) -> Result<Self, StorageError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = token {
            let header_value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
                StorageError::Api {
                    status: 0,
                    message: "Invalid access token format".to_string(),
                }
            })?;
            headers.insert(AUTHORIZATION, header_value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(StorageError::Network)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn api_base(&self) -> &str {
        &self.base_url
    }

    fn object_url(&self, bucket: &str, key: &str) -> String {
        format!(
            "{}/storage/v1/b/{}/o/{}?alt=media",
            self.base_url,
            urlencoding::encode(bucket),
            urlencoding::encode(key)
        )
    }

    pub async fn fetch_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let response = self.client.get(self.object_url(bucket, key)).send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response.bytes().await?.to_vec());
        }

        let message = error_message(response).await;
        Err(match status {
            StatusCode::NOT_FOUND => StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            },
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StorageError::PermissionDenied {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message,
            },
            _ => StorageError::Api {
                status: status.as_u16(),
                message,
            },
        })
    }

    // NOTE: Follows nextPageToken until the listing is exhausted
    pub async fn list_all_objects(&self, bucket: &str) -> Result<Vec<String>, StorageError> {
        let base = format!(
            "{}/storage/v1/b/{}/o",
            self.base_url,
            urlencoding::encode(bucket)
        );
        let mut names = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let url = match &page_token {
                Some(t) => format!("{}?pageToken={}", base, urlencoding::encode(t)),
                None => base.clone(),
            };

            let response = self.client.get(&url).send().await?;
            let status = response.status();

            if !status.is_success() {
                let message = error_message(response).await;
                return Err(match status {
                    StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                        StorageError::PermissionDenied {
                            bucket: bucket.to_string(),
                            key: String::new(),
                            message,
                        }
                    }
                    _ => StorageError::Api {
                        status: status.as_u16(),
                        message,
                    },
                });
            }

            let page: ObjectList = response.json().await.map_err(|e| StorageError::Api {
                status: status.as_u16(),
                message: format!("Failed to parse object listing: {}", e),
            })?;

            names.extend(page.items.into_iter().map(|item| item.name));

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(t) => page_token = Some(t),
                None => break,
            }
        }

        Ok(names)
    }
}

async fn error_message(response: reqwest::Response) -> String {
    let status = response.status();
    match response.json::<ErrorBody>().await {
        Ok(body) if !body.error.message.is_empty() => body.error.message,
        _ => status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string(),
    }
}

#[async_trait]
impl ObjectStore for GcsClient {
    fn name(&self) -> &str {
        "gcs"
    }

    async fn list_objects(&self, bucket: &str) -> Result<Vec<String>, StorageError> {
        self.list_all_objects(bucket).await
    }

    async fn download_to_file(
        &self,
        bucket: &str,
        key: &str,
        dest: &Path,
    ) -> Result<u64, StorageError> {
        let bytes = self.fetch_object(bucket, key).await?;

        tokio::fs::write(dest, &bytes)
            .await
            .map_err(|source| StorageError::Write {
                path: dest.to_path_buf(),
                source,
            })?;

        Ok(bytes.len() as u64)
    }
}

impl std::fmt::Debug for GcsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcsClient")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .finish()
    }
}
