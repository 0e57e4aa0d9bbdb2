use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BlobStoreError {
    #[error("destination rejected credentials")]
    Unauthorized,
    #[error("destination denied the request: {0}")]
    Forbidden(String),
    #[error("container not found: {0}")]
    NotFound(String),
    #[error("destination returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("destination transport failure: {0}")]
    Transport(String),
}

/// Object storage that migrated files are written into.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn container_exists(&self, container: &str) -> Result<bool, BlobStoreError>;

    async fn create_container(&self, container: &str, region: &str)
        -> Result<(), BlobStoreError>;

    /// Writes `bytes` under `key`, replacing any existing blob with that key.
    async fn put(
        &self,
        container: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), BlobStoreError>;
}
