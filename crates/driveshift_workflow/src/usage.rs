use driveshift_contract::{AccountInfo, FilePredicate, ListQuery, OrderBy, RemoteFile, StorageQuota};
use driveshift_source::SourceService;
use serde::Serialize;

use crate::error::WorkflowError;
use crate::listing::{collect_matching, Listing};

const WARNING_PERCENT: f64 = 80.0;
const CRITICAL_PERCENT: f64 = 95.0;
const LARGEST_SHOWN: usize = 10;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HealthLevel {
    Healthy,
    Warning,
    Critical,
}

impl HealthLevel {
    pub fn from_percent(percent_used: f64) -> Self {
        if percent_used > CRITICAL_PERCENT {
            HealthLevel::Critical
        } else if percent_used > WARNING_PERCENT {
            HealthLevel::Warning
        } else {
            HealthLevel::Healthy
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UsageReport {
    pub account: Option<String>,
    pub quota: StorageQuota,
    pub percent_used: f64,
    pub health: HealthLevel,
    pub documents: usize,
    pub spreadsheets: usize,
    pub other: usize,
    pub trashed: usize,
    pub total_files: usize,
    pub truncated: bool,
    /// Largest non-document files still in the drive, biggest first.
    pub largest: Vec<RemoteFile>,
}

pub fn summarize_usage(account: &AccountInfo, listing: &Listing) -> UsageReport {
    let quota = account.quota.clone();
    let percent_used = match quota.limit {
        Some(limit) if limit > 0 => quota.usage as f64 / limit as f64 * 100.0,
        _ => 0.0,
    };

    let (mut documents, mut spreadsheets, mut trashed) = (0, 0, 0);
    let mut other: Vec<&RemoteFile> = Vec::new();
    for file in &listing.files {
        if file.trashed {
            trashed += 1;
        } else if file.is_document() {
            documents += 1;
        } else if file.is_spreadsheet() {
            spreadsheets += 1;
        } else {
            other.push(file);
        }
    }

    let other_count = other.len();
    other.sort_by(|a, b| b.billable_bytes().cmp(&a.billable_bytes()));
    let largest = other.into_iter().take(LARGEST_SHOWN).cloned().collect();

    UsageReport {
        account: account.email.clone(),
        quota,
        percent_used,
        health: HealthLevel::from_percent(percent_used),
        documents,
        spreadsheets,
        other: other_count,
        trashed,
        total_files: listing.files.len(),
        truncated: listing.truncated,
        largest,
    }
}

/// Quota plus a breakdown of every file, trashed ones included.
pub async fn collect_usage(
    source: &dyn SourceService,
    page_size: u32,
    max_files: usize,
) -> Result<UsageReport, WorkflowError> {
    let account = source.about().await.map_err(WorkflowError::source_auth)?;

    let predicate = FilePredicate {
        include_trashed: true,
        ..FilePredicate::default()
    };
    let query = ListQuery::new(predicate)
        .with_page_size(page_size)
        .ordered_by(OrderBy::QuotaBytesUsedDesc);
    let listing = collect_matching(source, &query, max_files)
        .await
        .map_err(WorkflowError::ListingFailure)?;

    Ok(summarize_usage(&account, &listing))
}
