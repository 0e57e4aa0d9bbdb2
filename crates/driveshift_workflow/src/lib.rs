pub mod cleanup;
pub mod error;
pub mod listing;
pub mod migrate;
pub mod report;
pub mod settings;
pub mod usage;

pub use cleanup::{CleanupPlan, CleanupResult, CleanupWorkflow};
pub use error::{FileFailure, TransferStep, WorkflowError};
pub use listing::{collect_matching, Listing};
pub use migrate::{
    DestinationHandle, DestinationState, MigrationJob, MigrationResult, MigrationWorkflow,
};
pub use report::{CleanupSummary, MigrationSummary, ReportSettings, UsageSummary};
pub use settings::{CleanupSettings, MigrationSettings, RunMode};
pub use usage::{collect_usage, summarize_usage, HealthLevel, UsageReport};
