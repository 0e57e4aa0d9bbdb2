use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use driveshift_contract::{AccountInfo, FilePage, ListQuery, RemoteFile, StorageQuota};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::service::{SourceError, SourceService};

const LIST_FIELDS: &str =
    "nextPageToken, files(id, name, mimeType, size, createdTime, modifiedTime, trashed)";
const ABOUT_FIELDS: &str = "user(emailAddress, displayName), storageQuota";

#[derive(Debug, Clone)]
pub struct DriveConfig {
    pub api_base: String,
    pub access_token: String,
    pub request_timeout: Duration,
}

/// Google Drive v3 REST client authenticated with a caller-supplied bearer token.
#[derive(Debug, Clone)]
pub struct DriveClient {
    client: Client,
    api_base: String,
    access_token: String,
}

impl DriveClient {
    pub fn new(config: DriveConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            access_token: config.access_token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path)
    }

    async fn checked(response: Response, subject: &str) -> Result<Response, SourceError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, body, subject))
    }
}

#[async_trait]
impl SourceService for DriveClient {
    async fn about(&self) -> Result<AccountInfo, SourceError> {
        let response = self
            .client
            .get(self.url("about"))
            .bearer_auth(&self.access_token)
            .query(&[("fields", ABOUT_FIELDS)])
            .send()
            .await
            .map_err(transport)?;

        let about: DriveAbout = Self::checked(response, "about")
            .await?
            .json()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))?;
        Ok(about.into())
    }

    async fn list_page(
        &self,
        query: &ListQuery,
        page_token: Option<&str>,
    ) -> Result<FilePage, SourceError> {
        let mut params: Vec<(&str, String)> = vec![
            ("pageSize", query.page_size.to_string()),
            ("fields", LIST_FIELDS.to_string()),
        ];
        if let Some(q) = query.predicate.to_query_string() {
            params.push(("q", q));
        }
        if let Some(order_by) = query.order_by {
            params.push(("orderBy", order_by.as_query_param().to_string()));
        }
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }

        debug!(page_token = ?page_token, "listing drive files");
        let response = self
            .client
            .get(self.url("files"))
            .bearer_auth(&self.access_token)
            .query(&params)
            .send()
            .await
            .map_err(transport)?;

        let list: DriveFileList = Self::checked(response, "files")
            .await?
            .json()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))?;
        Ok(list.into())
    }

    async fn download(&self, file_id: &str) -> Result<Vec<u8>, SourceError> {
        let response = self
            .client
            .get(self.url(&format!("files/{file_id}")))
            .bearer_auth(&self.access_token)
            .query(&[("alt", "media")])
            .send()
            .await
            .map_err(transport)?;

        let bytes = Self::checked(response, file_id)
            .await?
            .bytes()
            .await
            .map_err(transport)?;
        Ok(bytes.to_vec())
    }

    async fn delete(&self, file_id: &str) -> Result<(), SourceError> {
        let response = self
            .client
            .delete(self.url(&format!("files/{file_id}")))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(transport)?;

        Self::checked(response, file_id).await?;
        Ok(())
    }
}

fn transport(error: reqwest::Error) -> SourceError {
    SourceError::Transport(error.to_string())
}

fn status_error(status: StatusCode, body: String, subject: &str) -> SourceError {
    match status {
        StatusCode::UNAUTHORIZED => SourceError::Unauthorized,
        StatusCode::FORBIDDEN => SourceError::Forbidden(body),
        StatusCode::NOT_FOUND => SourceError::NotFound(subject.to_string()),
        other => SourceError::Http {
            status: other.as_u16(),
            body,
        },
    }
}

// Drive encodes int64 fields as JSON strings.
fn parse_count(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|value| value.parse().ok())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    name: String,
    size: Option<String>,
    mime_type: Option<String>,
    created_time: DateTime<Utc>,
    modified_time: Option<DateTime<Utc>>,
    #[serde(default)]
    trashed: bool,
}

impl From<DriveFile> for RemoteFile {
    fn from(file: DriveFile) -> Self {
        RemoteFile {
            size: parse_count(file.size.as_deref()),
            id: file.id,
            name: file.name,
            mime_type: file.mime_type,
            created_at: file.created_time,
            modified_at: file.modified_time,
            trashed: file.trashed,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
    next_page_token: Option<String>,
}

impl From<DriveFileList> for FilePage {
    fn from(list: DriveFileList) -> Self {
        FilePage {
            files: list.files.into_iter().map(RemoteFile::from).collect(),
            next_page_token: list.next_page_token.filter(|token| !token.is_empty()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveUser {
    email_address: Option<String>,
    display_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveQuota {
    limit: Option<String>,
    usage: Option<String>,
    usage_in_drive: Option<String>,
    usage_in_drive_trash: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveAbout {
    #[serde(default)]
    user: DriveUser,
    #[serde(default)]
    storage_quota: DriveQuota,
}

impl From<DriveAbout> for AccountInfo {
    fn from(about: DriveAbout) -> Self {
        let quota = about.storage_quota;
        AccountInfo {
            email: about.user.email_address,
            display_name: about.user.display_name,
            quota: StorageQuota {
                limit: parse_count(quota.limit.as_deref()),
                usage: parse_count(quota.usage.as_deref()).unwrap_or(0),
                usage_in_drive: parse_count(quota.usage_in_drive.as_deref()).unwrap_or(0),
                usage_in_trash: parse_count(quota.usage_in_drive_trash.as_deref()).unwrap_or(0),
            },
        }
    }
}
