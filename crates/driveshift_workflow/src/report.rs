//! Human-readable run summaries. The layout is for people, not parsers.

use std::fmt;

use crate::cleanup::CleanupResult;
use crate::migrate::{DestinationState, MigrationResult};
use crate::settings::RunMode;
use crate::usage::{HealthLevel, UsageReport};

const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;
const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;
const NAME_WIDTH: usize = 60;

#[derive(Debug, Clone, Copy)]
pub struct ReportSettings {
    pub cost_per_gb_month: f64,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            cost_per_gb_month: 0.02,
        }
    }
}

impl ReportSettings {
    pub fn monthly_cost(&self, bytes: u64) -> f64 {
        gib(bytes) * self.cost_per_gb_month
    }
}

pub fn gib(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_GIB
}

pub fn mib(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MIB
}

fn short_name(name: &str) -> String {
    name.chars().take(NAME_WIDTH).collect()
}

fn remaining_line(f: &mut fmt::Formatter<'_>, total: usize, shown: usize) -> fmt::Result {
    if total > shown {
        writeln!(f, "    ... and {} more files", total - shown)?;
    }
    Ok(())
}

pub struct MigrationSummary<'a> {
    result: &'a MigrationResult,
    settings: ReportSettings,
}

impl<'a> MigrationSummary<'a> {
    pub fn new(result: &'a MigrationResult, settings: ReportSettings) -> Self {
        Self { result, settings }
    }
}

impl fmt::Display for MigrationSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.result;
        let planned_gb = gib(r.planned_bytes);
        let destination = &r.destination;

        match r.mode {
            RunMode::Simulate => writeln!(f, "DRY RUN: no files were moved")?,
            RunMode::Execute => writeln!(f, "LIVE RUN: files were moved")?,
        }

        match &destination.state {
            DestinationState::Existing => {
                writeln!(f, "Destination: existing container {}", destination.container)?
            }
            DestinationState::Created => writeln!(
                f,
                "Destination: created container {} in {}",
                destination.container, destination.region
            )?,
            DestinationState::WouldCreate => writeln!(
                f,
                "Destination: container {} does not exist; would create in {}",
                destination.container, destination.region
            )?,
            DestinationState::Unverified(reason) => writeln!(
                f,
                "Destination: could not verify container {}: {}",
                destination.container, reason
            )?,
        }

        writeln!(f, "Matched {} files ({:.2} GB)", r.planned_files, planned_gb)?;
        if r.truncated {
            writeln!(
                f,
                "WARNING: listing stopped at {} files; more matching files remain at the source",
                r.planned_files
            )?;
        }

        if r.planned_files == 0 {
            return writeln!(f, "No files to migrate.");
        }

        match r.mode {
            RunMode::Simulate => {
                writeln!(
                    f,
                    "Would migrate {} files ({:.2} GB)",
                    r.planned_files, planned_gb
                )?;
                writeln!(f, "Files to migrate (first {}):", r.sample.len())?;
                for file in &r.sample {
                    writeln!(
                        f,
                        "    {:7.2} MB - {}",
                        mib(file.billable_bytes()),
                        short_name(&file.name)
                    )?;
                }
                remaining_line(f, r.planned_files, r.sample.len())?;
                writeln!(f, "Re-run with --migrate to move these files.")?;
            }
            RunMode::Execute => {
                writeln!(f, "Migrated {} files ({:.2} GB)", r.migrated, gib(r.bytes_moved))?;
                if r.failed > 0 {
                    writeln!(f, "Failed to migrate {} files:", r.failed)?;
                    for failure in &r.failures {
                        writeln!(f, "    {failure}")?;
                    }
                }
            }
        }

        writeln!(f, "Source storage freed: {:.2} GB", gib(r.bytes_moved))?;
        writeln!(
            f,
            "Estimated destination cost: ${:.2}/month",
            self.settings.monthly_cost(r.planned_bytes)
        )?;
        writeln!(
            f,
            "Destination path: {}/{}",
            destination.container, r.key_prefix
        )
    }
}

pub struct CleanupSummary<'a> {
    result: &'a CleanupResult,
}

impl<'a> CleanupSummary<'a> {
    pub fn new(result: &'a CleanupResult) -> Self {
        Self { result }
    }
}

impl fmt::Display for CleanupSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.result;
        match r.mode {
            RunMode::Simulate => writeln!(f, "DRY RUN: no files were deleted")?,
            RunMode::Execute => writeln!(f, "LIVE RUN: files were deleted")?,
        }

        if r.planned_files == 0 {
            return writeln!(f, "No files older than {} days found.", r.older_than_days);
        }

        writeln!(
            f,
            "Files older than {} days (created before {}): {} ({:.2} GB)",
            r.older_than_days,
            r.cutoff.format("%Y-%m-%d"),
            r.planned_files,
            gib(r.planned_bytes)
        )?;
        if r.truncated {
            writeln!(f, "WARNING: listing was capped; more old files remain")?;
        }

        writeln!(f, "Files (first {}):", r.sample.len())?;
        for file in &r.sample {
            writeln!(
                f,
                "    {:7.2} MB - {} - {}",
                mib(file.billable_bytes()),
                file.created_at.format("%Y-%m-%d"),
                short_name(&file.name)
            )?;
        }
        remaining_line(f, r.planned_files, r.sample.len())?;

        match r.mode {
            RunMode::Simulate => {
                writeln!(
                    f,
                    "Would delete {} files ({:.2} GB). Re-run with --delete to remove them.",
                    r.planned_files,
                    gib(r.planned_bytes)
                )
            }
            RunMode::Execute => {
                writeln!(f, "Deleted {} files", r.deleted)?;
                if r.failed > 0 {
                    writeln!(f, "Failed to delete {} files:", r.failed)?;
                    for failure in &r.failures {
                        writeln!(f, "    {failure}")?;
                    }
                }
                writeln!(f, "Freed approximately {:.2} GB", gib(r.bytes_freed))
            }
        }
    }
}

pub struct UsageSummary<'a> {
    report: &'a UsageReport,
}

impl<'a> UsageSummary<'a> {
    pub fn new(report: &'a UsageReport) -> Self {
        Self { report }
    }
}

impl fmt::Display for UsageSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.report;
        let q = &r.quota;

        if let Some(account) = &r.account {
            writeln!(f, "Account: {account}")?;
        }
        writeln!(f, "Storage quota:")?;
        match q.limit {
            Some(limit) => {
                writeln!(f, "    Total limit: {:.2} GB", gib(limit))?;
                writeln!(f, "    Used:        {:.2} GB ({:.1}%)", gib(q.usage), r.percent_used)?;
                writeln!(
                    f,
                    "    Available:   {:.2} GB",
                    gib(limit.saturating_sub(q.usage))
                )?;
            }
            None => {
                writeln!(f, "    Total limit: unlimited")?;
                writeln!(f, "    Used:        {:.2} GB", gib(q.usage))?;
            }
        }
        writeln!(f, "    In drive:    {:.2} GB", gib(q.usage_in_drive))?;
        writeln!(f, "    In trash:    {:.2} GB", gib(q.usage_in_trash))?;

        match r.health {
            HealthLevel::Critical => {
                writeln!(f, "CRITICAL: storage is {:.1}% full", r.percent_used)?
            }
            HealthLevel::Warning => writeln!(f, "WARNING: storage is {:.1}% full", r.percent_used)?,
            HealthLevel::Healthy => writeln!(f, "Storage usage is healthy")?,
        }

        writeln!(f, "File breakdown:")?;
        writeln!(f, "    Documents:    {}", r.documents)?;
        writeln!(f, "    Spreadsheets: {}", r.spreadsheets)?;
        writeln!(f, "    Other files:  {}", r.other)?;
        writeln!(f, "    In trash:     {}", r.trashed)?;
        writeln!(f, "    Total:        {}", r.total_files)?;
        if r.truncated {
            writeln!(f, "WARNING: listing was capped; counts are partial")?;
        }

        if !r.largest.is_empty() {
            writeln!(f, "Largest files (excluding documents and spreadsheets):")?;
            for file in &r.largest {
                writeln!(
                    f,
                    "    {:.2} MB - {}",
                    mib(file.billable_bytes()),
                    short_name(&file.name)
                )?;
            }
        }

        if r.health == HealthLevel::Critical {
            writeln!(f, "Free space now:")?;
            writeln!(
                f,
                "    empty the trash ({} files, {:.2} GB)",
                r.trashed,
                gib(q.usage_in_trash)
            )?;
            writeln!(f, "    run `driveshift cleanup` to remove old exports")?;
            writeln!(f, "    run `driveshift migrate` to move exports to blob storage")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate::DestinationHandle;

    fn simulated(planned_files: usize, truncated: bool) -> MigrationResult {
        MigrationResult {
            mode: RunMode::Simulate,
            destination: DestinationHandle {
                container: "exports".to_string(),
                region: "us-central1".to_string(),
                state: DestinationState::WouldCreate,
            },
            key_prefix: "csv-exports/".to_string(),
            planned_files,
            planned_bytes: 5 * 1024 * 1024 * 1024,
            truncated,
            migrated: 0,
            failed: 0,
            bytes_moved: 0,
            sample: Vec::new(),
            failures: Vec::new(),
        }
    }

    #[test]
    fn cost_uses_fixed_rate_per_gib() {
        let settings = ReportSettings::default();
        let cost = settings.monthly_cost(10 * 1024 * 1024 * 1024);
        assert!((cost - 0.20).abs() < 1e-9);
    }

    #[test]
    fn simulate_summary_mentions_would_create_and_cost() {
        let result = simulated(12, false);
        let text = MigrationSummary::new(&result, ReportSettings::default()).to_string();
        assert!(text.contains("DRY RUN"));
        assert!(text.contains("would create in us-central1"));
        assert!(text.contains("Would migrate 12 files (5.00 GB)"));
        assert!(text.contains("... and 12 more files"));
        assert!(text.contains("$0.10/month"));
    }

    #[test]
    fn truncated_listing_is_reported() {
        let result = simulated(3, true);
        let text = MigrationSummary::new(&result, ReportSettings::default()).to_string();
        assert!(text.contains("listing stopped at 3 files"));
    }
}
