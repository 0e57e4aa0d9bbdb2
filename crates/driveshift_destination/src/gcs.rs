use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Response, StatusCode};
use serde_json::json;
use tracing::debug;

use crate::store::{BlobStore, BlobStoreError};

#[derive(Debug, Clone)]
pub struct GcsConfig {
    pub api_base: String,
    pub project: String,
    pub access_token: String,
    pub request_timeout: Duration,
}

/// Cloud Storage JSON API client authenticated with a caller-supplied bearer token.
#[derive(Debug, Clone)]
pub struct GcsClient {
    client: Client,
    api_base: String,
    project: String,
    access_token: String,
}

impl GcsClient {
    pub fn new(config: GcsConfig) -> Result<Self, BlobStoreError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(transport)?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            project: config.project,
            access_token: config.access_token,
        })
    }

    async fn checked(response: Response, subject: &str) -> Result<Response, BlobStoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, body, subject))
    }
}

#[async_trait]
impl BlobStore for GcsClient {
    async fn container_exists(&self, container: &str) -> Result<bool, BlobStoreError> {
        let response = self
            .client
            .get(format!("{}/storage/v1/b/{}", self.api_base, container))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(transport)?;

        match Self::checked(response, container).await {
            Ok(_) => Ok(true),
            Err(BlobStoreError::NotFound(_)) => Ok(false),
            Err(other) => Err(other),
        }
    }

    async fn create_container(
        &self,
        container: &str,
        region: &str,
    ) -> Result<(), BlobStoreError> {
        debug!(bucket = %container, region = %region, "creating bucket");
        let response = self
            .client
            .post(format!("{}/storage/v1/b", self.api_base))
            .bearer_auth(&self.access_token)
            .query(&[("project", self.project.as_str())])
            .json(&json!({ "name": container, "location": region }))
            .send()
            .await
            .map_err(transport)?;

        Self::checked(response, container).await?;
        Ok(())
    }

    async fn put(
        &self,
        container: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), BlobStoreError> {
        let response = self
            .client
            .post(format!("{}/upload/storage/v1/b/{}/o", self.api_base, container))
            .bearer_auth(&self.access_token)
            .query(&[("uploadType", "media"), ("name", key)])
            .header(header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(transport)?;

        Self::checked(response, key).await?;
        Ok(())
    }
}

fn transport(error: reqwest::Error) -> BlobStoreError {
    BlobStoreError::Transport(error.to_string())
}

fn status_error(status: StatusCode, body: String, subject: &str) -> BlobStoreError {
    match status {
        StatusCode::UNAUTHORIZED => BlobStoreError::Unauthorized,
        StatusCode::FORBIDDEN => BlobStoreError::Forbidden(body),
        StatusCode::NOT_FOUND => BlobStoreError::NotFound(subject.to_string()),
        other => BlobStoreError::Http {
            status: other.as_u16(),
            body,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_strips_trailing_slash() {
        let client = GcsClient::new(GcsConfig {
            api_base: "https://storage.googleapis.com/".to_string(),
            project: "analytics".to_string(),
            access_token: "token".to_string(),
            request_timeout: Duration::from_secs(5),
        })
        .expect("client");
        assert_eq!(client.api_base, "https://storage.googleapis.com");
    }

    #[test]
    fn forbidden_keeps_response_body() {
        assert_eq!(
            status_error(StatusCode::FORBIDDEN, "bucket quota".to_string(), "b"),
            BlobStoreError::Forbidden("bucket quota".to_string())
        );
        assert_eq!(
            status_error(StatusCode::NOT_FOUND, String::new(), "b"),
            BlobStoreError::NotFound("b".to_string())
        );
    }
}
