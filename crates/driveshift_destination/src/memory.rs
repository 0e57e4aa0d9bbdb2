use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::store::{BlobStore, BlobStoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Container {
    region: String,
    blobs: BTreeMap<String, StoredBlob>,
}

#[derive(Debug, Default)]
struct Faults {
    reject_credentials: bool,
    deny_create: bool,
    fail_exists_check: bool,
    puts: HashSet<String>,
}

/// Blob store held in memory. Every mutating call is counted, including
/// ones that fail.
#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    containers: RwLock<BTreeMap<String, Container>>,
    faults: RwLock<Faults>,
    create_calls: AtomicUsize,
    put_calls: AtomicUsize,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn with_container(self, container: &str, region: &str) -> Self {
        self.containers.write().await.insert(
            container.to_string(),
            Container {
                region: region.to_string(),
                blobs: BTreeMap::new(),
            },
        );
        self
    }

    pub async fn reject_credentials(&self) {
        self.faults.write().await.reject_credentials = true;
    }

    pub async fn deny_create(&self) {
        self.faults.write().await.deny_create = true;
    }

    pub async fn fail_exists_check(&self) {
        self.faults.write().await.fail_exists_check = true;
    }

    /// Makes every put for `key` fail.
    pub async fn fail_put(&self, key: &str) {
        self.faults.write().await.puts.insert(key.to_string());
    }

    pub async fn blob(&self, container: &str, key: &str) -> Option<StoredBlob> {
        self.containers
            .read()
            .await
            .get(container)
            .and_then(|c| c.blobs.get(key).cloned())
    }

    pub async fn keys(&self, container: &str) -> Vec<String> {
        self.containers
            .read()
            .await
            .get(container)
            .map(|c| c.blobs.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn region_of(&self, container: &str) -> Option<String> {
        self.containers
            .read()
            .await
            .get(container)
            .map(|c| c.region.clone())
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn put_calls(&self) -> usize {
        self.put_calls.load(Ordering::SeqCst)
    }

    pub fn mutating_calls(&self) -> usize {
        self.create_calls() + self.put_calls()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn container_exists(&self, container: &str) -> Result<bool, BlobStoreError> {
        let faults = self.faults.read().await;
        if faults.reject_credentials {
            return Err(BlobStoreError::Unauthorized);
        }
        if faults.fail_exists_check {
            return Err(BlobStoreError::Http {
                status: 503,
                body: "metadata service unavailable".to_string(),
            });
        }
        Ok(self.containers.read().await.contains_key(container))
    }

    async fn create_container(
        &self,
        container: &str,
        region: &str,
    ) -> Result<(), BlobStoreError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let faults = self.faults.read().await;
        if faults.reject_credentials {
            return Err(BlobStoreError::Unauthorized);
        }
        if faults.deny_create {
            return Err(BlobStoreError::Forbidden(format!(
                "caller may not create container {container}"
            )));
        }

        self.containers
            .write()
            .await
            .entry(container.to_string())
            .or_insert_with(|| Container {
                region: region.to_string(),
                blobs: BTreeMap::new(),
            });
        Ok(())
    }

    async fn put(
        &self,
        container: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), BlobStoreError> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        let faults = self.faults.read().await;
        if faults.reject_credentials {
            return Err(BlobStoreError::Unauthorized);
        }
        if faults.puts.contains(key) {
            return Err(BlobStoreError::Http {
                status: 500,
                body: format!("upload of {key} failed"),
            });
        }

        let mut containers = self.containers.write().await;
        let target = containers
            .get_mut(container)
            .ok_or_else(|| BlobStoreError::NotFound(container.to_string()))?;
        target.blobs.insert(
            key.to_string(),
            StoredBlob {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }
}
