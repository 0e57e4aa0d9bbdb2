use driveshift_contract::{FilePredicate, MAX_PAGE_SIZE};
use serde::{Deserialize, Serialize};

/// Gates every mutating call. Simulate is the default.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    #[default]
    Simulate,
    Execute,
}

impl RunMode {
    pub fn from_live_flag(live: bool) -> Self {
        if live {
            RunMode::Execute
        } else {
            RunMode::Simulate
        }
    }

    pub fn is_execute(self) -> bool {
        self == RunMode::Execute
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationSettings {
    pub predicate: FilePredicate,
    pub container: String,
    /// Region a missing container is created in.
    pub region: String,
    pub key_prefix: String,
    pub content_type: String,
    pub page_size: u32,
    /// Listing stops here and the job is flagged as truncated.
    pub max_files: usize,
    /// Files in flight at once. 1 keeps the run strictly sequential.
    pub workers: usize,
    pub sample_size: usize,
}

impl MigrationSettings {
    pub fn new(container: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            predicate: FilePredicate::csv_exports(),
            container: container.into(),
            region: region.into(),
            key_prefix: "csv-exports/".to_string(),
            content_type: mime::TEXT_CSV.essence_str().to_string(),
            page_size: MAX_PAGE_SIZE,
            max_files: 10_000,
            workers: 1,
            sample_size: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupSettings {
    pub predicate: FilePredicate,
    pub older_than_days: u32,
    pub page_size: u32,
    pub max_files: usize,
    pub sample_size: usize,
}

impl Default for CleanupSettings {
    fn default() -> Self {
        Self {
            predicate: FilePredicate::csv_exports(),
            older_than_days: 30,
            page_size: MAX_PAGE_SIZE,
            max_files: 10_000,
            sample_size: 20,
        }
    }
}
