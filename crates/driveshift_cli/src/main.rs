mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use driveshift_destination::{GcsClient, GcsConfig};
use driveshift_source::{DriveClient, DriveConfig};
use driveshift_workflow::{
    collect_usage, CleanupSummary, CleanupWorkflow, MigrationSummary, MigrationWorkflow, RunMode,
    UsageSummary,
};
use tracing::{info, warn};

use crate::config::{access_token, RuntimeConfig};

const DEFAULT_CONFIG: &str = "config/driveshift.toml";

#[derive(Debug, Parser)]
#[command(author, version, about = "Drive storage maintenance: migrate, clean up and audit files")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Move matching files from the drive into blob storage.
    Migrate {
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
        /// Actually move files. Without it the run is a dry run.
        #[arg(long, alias = "live")]
        migrate: bool,
    },
    /// Delete matching files older than a number of days.
    Cleanup {
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
        #[arg(long)]
        days: Option<u32>,
        /// Actually delete files. Without it the run is a dry run.
        #[arg(long, alias = "live")]
        delete: bool,
    },
    /// Report quota usage and a breakdown of stored files.
    Usage {
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,reqwest=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Migrate { config, migrate } => {
            migrate_files(config, RunMode::from_live_flag(migrate)).await
        }
        Command::Cleanup {
            config,
            days,
            delete,
        } => cleanup_files(config, days, RunMode::from_live_flag(delete)).await,
        Command::Usage { config } => report_usage(config).await,
    }
}

fn drive_client(config: &RuntimeConfig) -> Result<DriveClient> {
    let token = access_token(&config.source.token_env, "source")?;
    DriveClient::new(DriveConfig {
        api_base: config.source.api_base.clone(),
        access_token: token,
        request_timeout: config.source_timeout(),
    })
    .context("failed to build drive client")
}

fn gcs_client(config: &RuntimeConfig) -> Result<GcsClient> {
    let token = access_token(&config.destination.token_env, "destination")?;
    GcsClient::new(GcsConfig {
        api_base: config.destination.api_base.clone(),
        project: config.destination.project.clone(),
        access_token: token,
        request_timeout: config.destination_timeout(),
    })
    .context("failed to build storage client")
}

fn announce(mode: RunMode, action: &str) {
    match mode {
        RunMode::Simulate => info!("dry run: no files will be {action}"),
        RunMode::Execute => warn!("live run: files WILL be {action}"),
    }
}

async fn migrate_files(config_path: PathBuf, mode: RunMode) -> Result<()> {
    let config = RuntimeConfig::load(&config_path)?;
    announce(mode, "moved");

    let source = Arc::new(drive_client(&config)?);
    let destination = Arc::new(gcs_client(&config)?);
    let workflow =
        MigrationWorkflow::new(source, destination, config.migration_settings(), mode);

    let result = workflow.run().await.context("migration aborted")?;
    println!(
        "{}",
        MigrationSummary::new(&result, config.report_settings())
    );
    Ok(())
}

async fn cleanup_files(config_path: PathBuf, days: Option<u32>, mode: RunMode) -> Result<()> {
    let config = RuntimeConfig::load(&config_path)?;
    announce(mode, "deleted");

    let source = Arc::new(drive_client(&config)?);
    let workflow = CleanupWorkflow::new(source, config.cleanup_settings(days), mode);

    let result = workflow.run(Utc::now()).await.context("cleanup aborted")?;
    println!("{}", CleanupSummary::new(&result));
    Ok(())
}

async fn report_usage(config_path: PathBuf) -> Result<()> {
    let config = RuntimeConfig::load(&config_path)?;
    let source = drive_client(&config)?;

    let report = collect_usage(&source, config.source.page_size, config.source.max_files)
        .await
        .context("usage report failed")?;
    println!("{}", UsageSummary::new(&report));
    Ok(())
}
