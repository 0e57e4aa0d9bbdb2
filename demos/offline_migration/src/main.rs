use std::sync::Arc;

use chrono::{Duration, Utc};
use driveshift_contract::RemoteFile;
use driveshift_destination::InMemoryBlobStore;
use driveshift_source::InMemorySource;
use driveshift_workflow::{
    MigrationSettings, MigrationSummary, MigrationWorkflow, ReportSettings, RunMode,
};

#[tokio::main]
async fn main() {
    let source = Arc::new(InMemorySource::new().with_account_email("etl@example.com"));
    for (i, rows) in [120_000usize, 48_000, 0].into_iter().enumerate() {
        let content = "company,title,salary\n".repeat(rows.max(1));
        source
            .insert(
                RemoteFile {
                    id: format!("file-{i}"),
                    name: format!("linkedin-export-{i}.csv"),
                    size: (rows > 0).then_some(content.len() as u64),
                    mime_type: Some("text/csv".to_string()),
                    created_at: Utc::now() - Duration::days(40 - i as i64),
                    modified_at: None,
                    trashed: false,
                },
                content.into_bytes(),
            )
            .await;
    }

    let store = Arc::new(InMemoryBlobStore::new());
    let settings = MigrationSettings::new("csv-exports-demo", "us-central1");

    for mode in [RunMode::Simulate, RunMode::Execute] {
        let workflow =
            MigrationWorkflow::new(source.clone(), store.clone(), settings.clone(), mode);
        match workflow.run().await {
            Ok(result) => {
                println!("{}", MigrationSummary::new(&result, ReportSettings::default()))
            }
            Err(error) => eprintln!("migration aborted: {error}"),
        }
    }

    println!(
        "source files left: {}, blobs stored: {}",
        source.len().await,
        store.keys("csv-exports-demo").await.len()
    );
}
