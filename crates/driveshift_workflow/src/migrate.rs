use std::pin::pin;
use std::sync::Arc;

use driveshift_contract::{destination_key, AccountInfo, ListQuery, RemoteFile};
use driveshift_destination::{BlobStore, BlobStoreError};
use driveshift_source::SourceService;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::error::{FileFailure, TransferStep, WorkflowError};
use crate::listing::collect_matching;
use crate::settings::{MigrationSettings, RunMode};

const PROGRESS_EVERY: usize = 5;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum DestinationState {
    Existing,
    Created,
    /// Simulate mode found no container and skipped creating it.
    WouldCreate,
    /// Simulate mode could not check the container. Advisory only.
    Unverified(String),
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DestinationHandle {
    pub container: String,
    pub region: String,
    pub state: DestinationState,
}

/// Files matched by one listing pass. Never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationJob {
    pub mode: RunMode,
    pub files: Vec<RemoteFile>,
    pub total_bytes: u64,
    pub truncated: bool,
}

/// Outcome of a run. Simulate and execute produce the same shape; in
/// simulate mode `migrated`, `failed` and `bytes_moved` stay at zero.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationResult {
    pub mode: RunMode,
    pub destination: DestinationHandle,
    pub key_prefix: String,
    pub planned_files: usize,
    pub planned_bytes: u64,
    pub truncated: bool,
    pub migrated: usize,
    pub failed: usize,
    pub bytes_moved: u64,
    pub sample: Vec<RemoteFile>,
    pub failures: Vec<FileFailure>,
}

/// Moves matching files from the source service into a blob container.
///
/// Each file goes download, upload, delete in that order. The source copy is
/// only deleted once the upload has been acknowledged. Concurrent runs against
/// the same source and container are unsupported.
pub struct MigrationWorkflow {
    source: Arc<dyn SourceService>,
    destination: Arc<dyn BlobStore>,
    settings: MigrationSettings,
    mode: RunMode,
}

impl MigrationWorkflow {
    pub fn new(
        source: Arc<dyn SourceService>,
        destination: Arc<dyn BlobStore>,
        settings: MigrationSettings,
        mode: RunMode,
    ) -> Self {
        Self {
            source,
            destination,
            settings,
            mode,
        }
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    pub fn settings(&self) -> &MigrationSettings {
        &self.settings
    }

    pub async fn authenticate(&self) -> Result<AccountInfo, WorkflowError> {
        self.source.about().await.map_err(WorkflowError::source_auth)
    }

    /// Lists every matching file. Read-only.
    pub async fn plan(&self) -> Result<MigrationJob, WorkflowError> {
        let query = ListQuery::new(self.settings.predicate.clone())
            .with_page_size(self.settings.page_size);
        let listing = collect_matching(self.source.as_ref(), &query, self.settings.max_files)
            .await
            .map_err(WorkflowError::ListingFailure)?;

        info!(
            files = listing.files.len(),
            bytes = listing.total_bytes,
            truncated = listing.truncated,
            "migration planned"
        );
        Ok(MigrationJob {
            mode: self.mode,
            files: listing.files,
            total_bytes: listing.total_bytes,
            truncated: listing.truncated,
        })
    }

    pub async fn ensure_destination(
        &self,
        container: &str,
    ) -> Result<DestinationHandle, WorkflowError> {
        let handle = |state: DestinationState| DestinationHandle {
            container: container.to_string(),
            region: self.settings.region.clone(),
            state,
        };

        let exists = match self.destination.container_exists(container).await {
            Ok(exists) => exists,
            Err(BlobStoreError::Unauthorized) => {
                return Err(WorkflowError::destination_auth(BlobStoreError::Unauthorized))
            }
            Err(error) if self.mode.is_execute() => {
                return Err(WorkflowError::DestinationUnavailable {
                    container: container.to_string(),
                    reason: error.to_string(),
                })
            }
            Err(error) => {
                warn!(
                    container = %container,
                    error = %error,
                    "could not verify destination container"
                );
                return Ok(handle(DestinationState::Unverified(error.to_string())));
            }
        };

        if exists {
            info!(container = %container, "using existing destination container");
            return Ok(handle(DestinationState::Existing));
        }

        if !self.mode.is_execute() {
            info!(
                container = %container,
                region = %self.settings.region,
                "destination container missing; would create"
            );
            return Ok(handle(DestinationState::WouldCreate));
        }

        match self
            .destination
            .create_container(container, &self.settings.region)
            .await
        {
            Ok(()) => {
                info!(
                    container = %container,
                    region = %self.settings.region,
                    "created destination container"
                );
                Ok(handle(DestinationState::Created))
            }
            Err(BlobStoreError::Unauthorized) => {
                Err(WorkflowError::destination_auth(BlobStoreError::Unauthorized))
            }
            Err(error) => Err(WorkflowError::DestinationUnavailable {
                container: container.to_string(),
                reason: error.to_string(),
            }),
        }
    }

    /// Migrates every file in `job`. Never fails as a whole; per-file
    /// failures are tallied in the result.
    pub async fn execute(
        &self,
        job: &MigrationJob,
        destination: &DestinationHandle,
    ) -> MigrationResult {
        let mut result = MigrationResult {
            mode: self.mode,
            destination: destination.clone(),
            key_prefix: self.settings.key_prefix.clone(),
            planned_files: job.files.len(),
            planned_bytes: job.total_bytes,
            truncated: job.truncated,
            migrated: 0,
            failed: 0,
            bytes_moved: 0,
            sample: job
                .files
                .iter()
                .take(self.settings.sample_size)
                .cloned()
                .collect(),
            failures: Vec::new(),
        };

        if !self.mode.is_execute() {
            info!(
                files = result.planned_files,
                bytes = result.planned_bytes,
                "simulate mode: no files transferred"
            );
            return result;
        }

        let container = destination.container.as_str();
        let total = job.files.len();
        let mut outcomes = pin!(stream::iter(job.files.iter())
            .map(|file| async move { (file, self.migrate_file(file, container).await) })
            .buffer_unordered(self.settings.workers.max(1)));

        while let Some((file, outcome)) = outcomes.next().await {
            match outcome {
                Ok(bytes) => {
                    result.migrated += 1;
                    result.bytes_moved += bytes;
                    if result.migrated % PROGRESS_EVERY == 0 {
                        info!(migrated = result.migrated, total, "migration progress");
                    }
                }
                Err(failure) => {
                    warn!(
                        file_id = %file.id,
                        name = %file.name,
                        step = %failure.step,
                        error = %failure.reason,
                        "file migration failed"
                    );
                    result.failed += 1;
                    result.failures.push(failure);
                }
            }
        }

        info!(
            migrated = result.migrated,
            failed = result.failed,
            bytes_moved = result.bytes_moved,
            "migration finished"
        );
        result
    }

    /// Authenticate, check the destination, plan, then execute.
    pub async fn run(&self) -> Result<MigrationResult, WorkflowError> {
        let span = info_span!("migration", run_id = %Uuid::now_v7(), mode = ?self.mode);
        async {
            let account = self.authenticate().await?;
            info!(
                account = account.email.as_deref().unwrap_or("unknown"),
                "source authenticated"
            );
            let destination = self.ensure_destination(&self.settings.container).await?;
            let job = self.plan().await?;
            Ok::<_, WorkflowError>(self.execute(&job, &destination).await)
        }
        .instrument(span)
        .await
    }

    // The payload is moved into the upload and dropped before the delete.
    async fn migrate_file(&self, file: &RemoteFile, container: &str) -> Result<u64, FileFailure> {
        let bytes = self
            .source
            .download(&file.id)
            .await
            .map_err(|e| FileFailure::new(file, TransferStep::Download, e))?;
        let length = bytes.len() as u64;

        let key = destination_key(&self.settings.key_prefix, &file.name);
        self.destination
            .put(container, &key, bytes, &self.settings.content_type)
            .await
            .map_err(|e| FileFailure::new(file, TransferStep::Upload, e))?;

        self.source
            .delete(&file.id)
            .await
            .map_err(|e| FileFailure::new(file, TransferStep::Delete, e))?;
        Ok(length)
    }
}
