use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use driveshift_contract::{AccountInfo, ListQuery, OrderBy, RemoteFile};
use driveshift_source::SourceService;
use serde::Serialize;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::error::{FileFailure, TransferStep, WorkflowError};
use crate::listing::collect_matching;
use crate::settings::{CleanupSettings, RunMode};

const PROGRESS_EVERY: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct CleanupPlan {
    pub cutoff: DateTime<Utc>,
    pub files: Vec<RemoteFile>,
    pub total_bytes: u64,
    pub truncated: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CleanupResult {
    pub mode: RunMode,
    pub cutoff: DateTime<Utc>,
    pub older_than_days: u32,
    pub planned_files: usize,
    pub planned_bytes: u64,
    pub truncated: bool,
    pub deleted: usize,
    pub failed: usize,
    pub bytes_freed: u64,
    pub sample: Vec<RemoteFile>,
    pub failures: Vec<FileFailure>,
}

/// Deletes matching source files created before a cutoff.
pub struct CleanupWorkflow {
    source: Arc<dyn SourceService>,
    settings: CleanupSettings,
    mode: RunMode,
}

impl CleanupWorkflow {
    pub fn new(source: Arc<dyn SourceService>, settings: CleanupSettings, mode: RunMode) -> Self {
        Self {
            source,
            settings,
            mode,
        }
    }

    pub async fn authenticate(&self) -> Result<AccountInfo, WorkflowError> {
        self.source.about().await.map_err(WorkflowError::source_auth)
    }

    /// Oldest first, everything created more than `older_than_days` before `now`.
    pub async fn plan(&self, now: DateTime<Utc>) -> Result<CleanupPlan, WorkflowError> {
        let cutoff = now - Duration::days(i64::from(self.settings.older_than_days));
        let predicate = self.settings.predicate.clone().created_before(cutoff);
        let query = ListQuery::new(predicate)
            .with_page_size(self.settings.page_size)
            .ordered_by(OrderBy::CreatedTime);

        let listing = collect_matching(self.source.as_ref(), &query, self.settings.max_files)
            .await
            .map_err(WorkflowError::ListingFailure)?;

        info!(
            files = listing.files.len(),
            bytes = listing.total_bytes,
            cutoff = %cutoff,
            "cleanup planned"
        );
        Ok(CleanupPlan {
            cutoff,
            files: listing.files,
            total_bytes: listing.total_bytes,
            truncated: listing.truncated,
        })
    }

    pub async fn execute(&self, plan: &CleanupPlan) -> CleanupResult {
        let mut result = CleanupResult {
            mode: self.mode,
            cutoff: plan.cutoff,
            older_than_days: self.settings.older_than_days,
            planned_files: plan.files.len(),
            planned_bytes: plan.total_bytes,
            truncated: plan.truncated,
            deleted: 0,
            failed: 0,
            bytes_freed: 0,
            sample: plan
                .files
                .iter()
                .take(self.settings.sample_size)
                .cloned()
                .collect(),
            failures: Vec::new(),
        };

        if !self.mode.is_execute() {
            return result;
        }

        let total = plan.files.len();
        for file in &plan.files {
            match self.source.delete(&file.id).await {
                Ok(()) => {
                    result.deleted += 1;
                    result.bytes_freed += file.billable_bytes();
                    if result.deleted % PROGRESS_EVERY == 0 {
                        info!(deleted = result.deleted, total, "cleanup progress");
                    }
                }
                Err(error) => {
                    warn!(file_id = %file.id, name = %file.name, error = %error, "delete failed");
                    result.failed += 1;
                    result
                        .failures
                        .push(FileFailure::new(file, TransferStep::Delete, error));
                }
            }
        }

        info!(deleted = result.deleted, failed = result.failed, "cleanup finished");
        result
    }

    pub async fn run(&self, now: DateTime<Utc>) -> Result<CleanupResult, WorkflowError> {
        let span = info_span!("cleanup", run_id = %Uuid::now_v7(), mode = ?self.mode);
        async {
            self.authenticate().await?;
            let plan = self.plan(now).await?;
            Ok::<_, WorkflowError>(self.execute(&plan).await)
        }
        .instrument(span)
        .await
    }
}
