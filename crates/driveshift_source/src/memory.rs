use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use driveshift_contract::{AccountInfo, FilePage, ListQuery, OrderBy, RemoteFile, StorageQuota};
use tokio::sync::RwLock;
use tracing::debug;

use crate::service::{SourceError, SourceService};

#[derive(Debug, Clone)]
struct StoredFile {
    meta: RemoteFile,
    content: Vec<u8>,
}

#[derive(Debug, Default)]
struct Faults {
    reject_credentials: bool,
    fail_listing: bool,
    downloads: HashSet<String>,
    deletes: HashSet<String>,
}

/// Source service held entirely in memory.
///
/// Page tokens are decimal offsets into the ordered match set. Faults can be
/// injected per file so callers can observe partial failure handling.
#[derive(Debug, Default)]
pub struct InMemorySource {
    files: RwLock<BTreeMap<String, StoredFile>>,
    faults: RwLock<Faults>,
    quota_limit: Option<u64>,
    account_email: Option<String>,
    list_calls: AtomicUsize,
    download_calls: AtomicUsize,
    delete_calls: AtomicUsize,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota_limit(mut self, limit: u64) -> Self {
        self.quota_limit = Some(limit);
        self
    }

    pub fn with_account_email(mut self, email: impl Into<String>) -> Self {
        self.account_email = Some(email.into());
        self
    }

    pub async fn insert(&self, file: RemoteFile, content: Vec<u8>) {
        let mut files = self.files.write().await;
        files.insert(
            file.id.clone(),
            StoredFile {
                meta: file,
                content,
            },
        );
    }

    /// Removes a file out of band, as another client would.
    pub async fn remove(&self, file_id: &str) -> bool {
        self.files.write().await.remove(file_id).is_some()
    }

    pub async fn contains(&self, file_id: &str) -> bool {
        self.files.read().await.contains_key(file_id)
    }

    pub async fn len(&self) -> usize {
        self.files.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.files.read().await.is_empty()
    }

    pub async fn reject_credentials(&self) {
        self.faults.write().await.reject_credentials = true;
    }

    pub async fn fail_listing(&self) {
        self.faults.write().await.fail_listing = true;
    }

    pub async fn fail_download(&self, file_id: &str) {
        self.faults.write().await.downloads.insert(file_id.to_string());
    }

    pub async fn fail_delete(&self, file_id: &str) {
        self.faults.write().await.deletes.insert(file_id.to_string());
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn download_calls(&self) -> usize {
        self.download_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    async fn check_credentials(&self) -> Result<(), SourceError> {
        if self.faults.read().await.reject_credentials {
            return Err(SourceError::Unauthorized);
        }
        Ok(())
    }
}

#[async_trait]
impl SourceService for InMemorySource {
    async fn about(&self) -> Result<AccountInfo, SourceError> {
        self.check_credentials().await?;

        let files = self.files.read().await;
        let (in_drive, in_trash) = files.values().fold((0u64, 0u64), |(live, trash), stored| {
            if stored.meta.trashed {
                (live, trash + stored.meta.billable_bytes())
            } else {
                (live + stored.meta.billable_bytes(), trash)
            }
        });

        Ok(AccountInfo {
            email: self.account_email.clone(),
            display_name: None,
            quota: StorageQuota {
                limit: self.quota_limit,
                usage: in_drive + in_trash,
                usage_in_drive: in_drive,
                usage_in_trash: in_trash,
            },
        })
    }

    async fn list_page(
        &self,
        query: &ListQuery,
        page_token: Option<&str>,
    ) -> Result<FilePage, SourceError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check_credentials().await?;
        if self.faults.read().await.fail_listing {
            return Err(SourceError::Http {
                status: 500,
                body: "listing unavailable".to_string(),
            });
        }

        let offset = match page_token {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| SourceError::Decode(format!("invalid page token {token}")))?,
            None => 0,
        };

        let files = self.files.read().await;
        let mut matched: Vec<RemoteFile> = files
            .values()
            .filter(|stored| query.predicate.matches(&stored.meta))
            .map(|stored| stored.meta.clone())
            .collect();

        match query.order_by {
            Some(OrderBy::CreatedTime) => {
                matched.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
            }
            Some(OrderBy::QuotaBytesUsedDesc) => matched.sort_by(|a, b| {
                b.billable_bytes()
                    .cmp(&a.billable_bytes())
                    .then(a.id.cmp(&b.id))
            }),
            None => {}
        }

        let page_size = query.page_size.max(1) as usize;
        let total = matched.len();
        let page: Vec<RemoteFile> = matched.into_iter().skip(offset).take(page_size).collect();
        let next = offset + page_size;
        let next_page_token = (next < total).then(|| next.to_string());

        debug!(offset, returned = page.len(), total, "in-memory listing page");
        Ok(FilePage {
            files: page,
            next_page_token,
        })
    }

    async fn download(&self, file_id: &str) -> Result<Vec<u8>, SourceError> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        self.check_credentials().await?;
        if self.faults.read().await.downloads.contains(file_id) {
            return Err(SourceError::Transport(format!(
                "download of {file_id} interrupted"
            )));
        }

        self.files
            .read()
            .await
            .get(file_id)
            .map(|stored| stored.content.clone())
            .ok_or_else(|| SourceError::NotFound(file_id.to_string()))
    }

    async fn delete(&self, file_id: &str) -> Result<(), SourceError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.check_credentials().await?;
        if self.faults.read().await.deletes.contains(file_id) {
            return Err(SourceError::Forbidden(format!(
                "insufficient permissions to delete {file_id}"
            )));
        }

        match self.files.write().await.remove(file_id) {
            Some(_) => Ok(()),
            None => Err(SourceError::NotFound(file_id.to_string())),
        }
    }
}
