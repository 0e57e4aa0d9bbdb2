use async_trait::async_trait;
use driveshift_contract::{AccountInfo, FilePage, ListQuery};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("source rejected credentials")]
    Unauthorized,
    #[error("source denied access: {0}")]
    Forbidden(String),
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("source returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("source transport failure: {0}")]
    Transport(String),
    #[error("unexpected source response: {0}")]
    Decode(String),
}

impl SourceError {
    pub fn is_auth(&self) -> bool {
        matches!(self, SourceError::Unauthorized | SourceError::Forbidden(_))
    }
}

/// The file-hosting service files are listed in and removed from.
#[async_trait]
pub trait SourceService: Send + Sync {
    /// Account identity and quota. Also serves as the credential probe.
    async fn about(&self) -> Result<AccountInfo, SourceError>;

    async fn list_page(
        &self,
        query: &ListQuery,
        page_token: Option<&str>,
    ) -> Result<FilePage, SourceError>;

    /// Full file content. The whole payload is held in memory.
    async fn download(&self, file_id: &str) -> Result<Vec<u8>, SourceError>;

    /// Permanently removes the file, bypassing trash.
    async fn delete(&self, file_id: &str) -> Result<(), SourceError>;
}
