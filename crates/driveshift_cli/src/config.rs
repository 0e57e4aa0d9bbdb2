use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use driveshift_contract::{FilePredicate, MAX_PAGE_SIZE};
use driveshift_workflow::{CleanupSettings, MigrationSettings, ReportSettings, WorkflowError};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeConfig {
    pub source: SourceSection,
    pub destination: DestinationSection,
    #[serde(default)]
    pub filter: FilterSection,
    #[serde(default)]
    pub migration: MigrationSection,
    #[serde(default)]
    pub cleanup: CleanupSection,
    #[serde(default)]
    pub report: ReportSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceSection {
    #[serde(default = "default_source_api")]
    pub api_base: String,
    #[serde(default = "default_source_token_env")]
    pub token_env: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_max_files")]
    pub max_files: usize,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DestinationSection {
    #[serde(default = "default_destination_api")]
    pub api_base: String,
    #[serde(default = "default_destination_token_env")]
    pub token_env: String,
    pub project: String,
    pub bucket: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilterSection {
    #[serde(default = "default_mime_types")]
    pub mime_types: Vec<String>,
    #[serde(default = "default_name_contains")]
    pub name_contains: Vec<String>,
    #[serde(default)]
    pub include_trashed: bool,
}

impl Default for FilterSection {
    fn default() -> Self {
        Self {
            mime_types: default_mime_types(),
            name_contains: default_name_contains(),
            include_trashed: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MigrationSection {
    #[serde(default = "default_content_type")]
    pub content_type: String,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_migration_sample")]
    pub sample_size: usize,
}

impl Default for MigrationSection {
    fn default() -> Self {
        Self {
            content_type: default_content_type(),
            workers: default_workers(),
            sample_size: default_migration_sample(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CleanupSection {
    #[serde(default = "default_cleanup_days")]
    pub days: u32,
    #[serde(default = "default_cleanup_sample")]
    pub sample_size: usize,
}

impl Default for CleanupSection {
    fn default() -> Self {
        Self {
            days: default_cleanup_days(),
            sample_size: default_cleanup_sample(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportSection {
    #[serde(default = "default_cost_per_gb")]
    pub cost_per_gb_month: f64,
}

impl Default for ReportSection {
    fn default() -> Self {
        Self {
            cost_per_gb_month: default_cost_per_gb(),
        }
    }
}

impl RuntimeConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: RuntimeConfig = toml::from_str(&source)
            .with_context(|| format!("invalid config TOML at {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_PAGE_SIZE).contains(&self.source.page_size) {
            bail!(
                "source.page_size must be between 1 and {MAX_PAGE_SIZE}, got {}",
                self.source.page_size
            );
        }
        if self.source.max_files == 0 {
            bail!("source.max_files must be at least 1");
        }
        if self.migration.workers == 0 {
            bail!("migration.workers must be at least 1");
        }
        if self.destination.bucket.trim().is_empty() {
            bail!("destination.bucket cannot be empty");
        }
        if self.report.cost_per_gb_month < 0.0 {
            bail!("report.cost_per_gb_month cannot be negative");
        }
        Ok(())
    }

    pub fn predicate(&self) -> FilePredicate {
        FilePredicate {
            mime_types: self.filter.mime_types.clone(),
            name_contains: self.filter.name_contains.clone(),
            created_before: None,
            include_trashed: self.filter.include_trashed,
        }
    }

    pub fn migration_settings(&self) -> MigrationSettings {
        MigrationSettings {
            predicate: self.predicate(),
            container: self.destination.bucket.clone(),
            region: self.destination.region.clone(),
            key_prefix: self.destination.key_prefix.clone(),
            content_type: self.migration.content_type.clone(),
            page_size: self.source.page_size,
            max_files: self.source.max_files,
            workers: self.migration.workers,
            sample_size: self.migration.sample_size,
        }
    }

    pub fn cleanup_settings(&self, days: Option<u32>) -> CleanupSettings {
        CleanupSettings {
            predicate: self.predicate(),
            older_than_days: days.unwrap_or(self.cleanup.days),
            page_size: self.source.page_size,
            max_files: self.source.max_files,
            sample_size: self.cleanup.sample_size,
        }
    }

    pub fn report_settings(&self) -> ReportSettings {
        ReportSettings {
            cost_per_gb_month: self.report.cost_per_gb_month,
        }
    }

    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.source.request_timeout_secs)
    }

    pub fn destination_timeout(&self) -> Duration {
        Duration::from_secs(self.destination.request_timeout_secs)
    }
}

/// Reads a bearer token from the environment. A missing or blank value is an
/// authentication failure for that service.
pub fn access_token(var: &str, service: &'static str) -> Result<String, WorkflowError> {
    match std::env::var(var) {
        Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        _ => Err(WorkflowError::AuthenticationFailure {
            service,
            reason: format!("environment variable {var} is not set"),
        }),
    }
}

fn default_source_api() -> String {
    "https://www.googleapis.com/drive/v3".to_string()
}

fn default_destination_api() -> String {
    "https://storage.googleapis.com".to_string()
}

fn default_source_token_env() -> String {
    "DRIVESHIFT_SOURCE_TOKEN".to_string()
}

fn default_destination_token_env() -> String {
    "DRIVESHIFT_DESTINATION_TOKEN".to_string()
}

fn default_page_size() -> u32 {
    MAX_PAGE_SIZE
}

fn default_max_files() -> usize {
    10_000
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_region() -> String {
    "us-central1".to_string()
}

fn default_key_prefix() -> String {
    "csv-exports/".to_string()
}

fn default_mime_types() -> Vec<String> {
    vec!["text/csv".to_string()]
}

fn default_name_contains() -> Vec<String> {
    vec![".csv".to_string()]
}

fn default_content_type() -> String {
    mime::TEXT_CSV.essence_str().to_string()
}

fn default_workers() -> usize {
    1
}

fn default_migration_sample() -> usize {
    10
}

fn default_cleanup_days() -> u32 {
    30
}

fn default_cleanup_sample() -> usize {
    20
}

fn default_cost_per_gb() -> f64 {
    0.02
}
