use std::sync::Arc;

use chrono::{TimeZone, Utc};
use driveshift_contract::RemoteFile;
use driveshift_destination::InMemoryBlobStore;
use driveshift_source::InMemorySource;
use driveshift_workflow::{
    DestinationState, MigrationSettings, MigrationWorkflow, RunMode, TransferStep, WorkflowError,
};

const MIB: u64 = 1024 * 1024;
const BUCKET: &str = "csv-exports-bucket";
const REGION: &str = "us-central1";

fn csv(id: &str, name: &str, size: Option<u64>) -> RemoteFile {
    RemoteFile {
        id: id.to_string(),
        name: name.to_string(),
        size,
        mime_type: Some("text/csv".to_string()),
        created_at: Utc.with_ymd_and_hms(2025, 4, 1, 9, 0, 0).unwrap(),
        modified_at: None,
        trashed: false,
    }
}

/// 10 MiB, 25 MiB and one file whose size the source does not report.
async fn three_file_source() -> Arc<InMemorySource> {
    let source = Arc::new(InMemorySource::new().with_account_email("etl@example.com"));
    source
        .insert(csv("ten", "ten.csv", Some(10 * MIB)), vec![1; (10 * MIB) as usize])
        .await;
    source
        .insert(
            csv("twenty-five", "twenty-five.csv", Some(25 * MIB)),
            vec![2; (25 * MIB) as usize],
        )
        .await;
    source
        .insert(csv("unknown", "unknown.csv", None), b"id,title\n".to_vec())
        .await;
    source
        .insert(
            RemoteFile {
                mime_type: Some("application/pdf".to_string()),
                ..csv("report", "report.pdf", Some(MIB))
            },
            vec![0; 16],
        )
        .await;
    source
}

fn workflow(
    source: &Arc<InMemorySource>,
    store: &Arc<InMemoryBlobStore>,
    mode: RunMode,
) -> MigrationWorkflow {
    MigrationWorkflow::new(
        source.clone(),
        store.clone(),
        MigrationSettings::new(BUCKET, REGION),
        mode,
    )
}

#[tokio::test]
async fn plan_counts_matches_and_sums_known_sizes() {
    let source = three_file_source().await;
    let store = Arc::new(InMemoryBlobStore::new());

    let job = workflow(&source, &store, RunMode::Simulate)
        .plan()
        .await
        .expect("plan");

    assert_eq!(job.files.len(), 3);
    assert_eq!(job.total_bytes, 35 * MIB);
    assert!(!job.truncated);
}

#[tokio::test]
async fn simulate_issues_no_mutating_calls() {
    let source = three_file_source().await;
    let store = Arc::new(InMemoryBlobStore::new());
    let migration = workflow(&source, &store, RunMode::Simulate);

    let result = migration.run().await.expect("run");

    assert_eq!(result.mode, RunMode::Simulate);
    assert_eq!(result.destination.state, DestinationState::WouldCreate);
    assert_eq!(result.planned_files, 3);
    assert_eq!(result.planned_bytes, 35 * MIB);
    assert_eq!(result.sample.len(), 3);
    assert_eq!(result.migrated, 0);
    assert_eq!(store.mutating_calls(), 0);
    assert_eq!(source.delete_calls(), 0);
    assert_eq!(source.download_calls(), 0);
    assert_eq!(source.len().await, 4);
}

#[tokio::test]
async fn simulate_tolerates_unverifiable_destination() {
    let source = three_file_source().await;
    let store = Arc::new(InMemoryBlobStore::new());
    store.fail_exists_check().await;

    let result = workflow(&source, &store, RunMode::Simulate)
        .run()
        .await
        .expect("advisory only");
    assert!(matches!(
        result.destination.state,
        DestinationState::Unverified(_)
    ));
    assert_eq!(result.planned_files, 3);
}

#[tokio::test]
async fn execute_isolates_failed_upload() {
    let source = three_file_source().await;
    let store = Arc::new(InMemoryBlobStore::new());
    store.fail_put("csv-exports/twenty-five.csv").await;

    let result = workflow(&source, &store, RunMode::Execute)
        .run()
        .await
        .expect("run");

    assert_eq!(result.destination.state, DestinationState::Created);
    assert_eq!(store.region_of(BUCKET).await.as_deref(), Some(REGION));
    assert_eq!(result.migrated, 2);
    assert_eq!(result.failed, 1);
    assert_eq!(result.bytes_moved, 10 * MIB + 9);
    assert_eq!(result.failures[0].file_id, "twenty-five");
    assert_eq!(result.failures[0].step, TransferStep::Upload);

    assert!(source.contains("twenty-five").await);
    assert!(store.blob(BUCKET, "csv-exports/twenty-five.csv").await.is_none());

    for (id, key) in [("ten", "csv-exports/ten.csv"), ("unknown", "csv-exports/unknown.csv")] {
        assert!(!source.contains(id).await, "{id} should be gone from the source");
        let blob = store.blob(BUCKET, key).await.expect("uploaded blob");
        assert_eq!(blob.content_type, "text/csv");
    }
    assert!(source.contains("report").await);
}

#[tokio::test]
async fn file_removed_after_plan_counts_as_failure() {
    let source = three_file_source().await;
    let store = Arc::new(
        InMemoryBlobStore::new()
            .with_container(BUCKET, REGION)
            .await,
    );
    let migration = workflow(&source, &store, RunMode::Execute);

    let destination = migration.ensure_destination(BUCKET).await.expect("destination");
    assert_eq!(destination.state, DestinationState::Existing);
    let job = migration.plan().await.expect("plan");
    assert!(source.remove("ten").await);

    let result = migration.execute(&job, &destination).await;
    assert_eq!(result.migrated, 2);
    assert_eq!(result.failed, 1);
    assert_eq!(result.failures[0].file_id, "ten");
    assert_eq!(result.failures[0].step, TransferStep::Download);
    assert!(store.blob(BUCKET, "csv-exports/ten.csv").await.is_none());
}

#[tokio::test]
async fn failed_delete_leaves_source_copy_in_place() {
    let source = three_file_source().await;
    source.fail_delete("unknown").await;
    let store = Arc::new(InMemoryBlobStore::new());

    let result = workflow(&source, &store, RunMode::Execute)
        .run()
        .await
        .expect("run");

    assert_eq!(result.failed, 1);
    assert_eq!(result.failures[0].step, TransferStep::Delete);
    assert!(source.contains("unknown").await);
}

#[tokio::test]
async fn rerun_after_full_migration_plans_nothing() {
    let source = three_file_source().await;
    let store = Arc::new(InMemoryBlobStore::new());

    let first = workflow(&source, &store, RunMode::Execute)
        .run()
        .await
        .expect("first run");
    assert_eq!(first.migrated, 3);
    assert_eq!(first.failed, 0);

    let second = workflow(&source, &store, RunMode::Execute)
        .run()
        .await
        .expect("second run");
    assert_eq!(second.planned_files, 0);
    assert_eq!(second.migrated, 0);
    assert_eq!(store.keys(BUCKET).await.len(), 3);
}

#[tokio::test]
async fn duplicate_names_overwrite_the_same_key() {
    let source = Arc::new(InMemorySource::new());
    source.insert(csv("a", "daily.csv", Some(5)), b"first".to_vec()).await;
    source.insert(csv("b", "daily.csv", Some(6)), b"second".to_vec()).await;
    let store = Arc::new(InMemoryBlobStore::new());

    let result = workflow(&source, &store, RunMode::Execute)
        .run()
        .await
        .expect("run");

    assert_eq!(result.migrated, 2);
    assert_eq!(store.keys(BUCKET).await, vec!["csv-exports/daily.csv".to_string()]);
    assert_eq!(store.put_calls(), 2);
}

#[tokio::test]
async fn parallel_workers_keep_per_file_ordering() {
    let source = Arc::new(InMemorySource::new());
    for i in 0..12 {
        source
            .insert(
                csv(&format!("f{i:02}"), &format!("part-{i:02}.csv"), Some(3)),
                b"abc".to_vec(),
            )
            .await;
    }
    source.fail_download("f03").await;
    let store = Arc::new(InMemoryBlobStore::new());

    let mut settings = MigrationSettings::new(BUCKET, REGION);
    settings.workers = 4;
    settings.page_size = 5;
    let migration =
        MigrationWorkflow::new(source.clone(), store.clone(), settings, RunMode::Execute);

    let result = migration.run().await.expect("run");
    assert_eq!(result.migrated, 11);
    assert_eq!(result.failed, 1);
    assert_eq!(result.bytes_moved, 33);
    assert!(source.contains("f03").await);
    assert_eq!(source.len().await, 1);
    assert_eq!(store.keys(BUCKET).await.len(), 11);
}

#[tokio::test]
async fn rejected_source_credentials_abort_before_listing() {
    let source = three_file_source().await;
    source.reject_credentials().await;
    let store = Arc::new(InMemoryBlobStore::new());

    let err = workflow(&source, &store, RunMode::Execute)
        .run()
        .await
        .expect_err("auth failure");

    assert!(matches!(
        err,
        WorkflowError::AuthenticationFailure { service: "source", .. }
    ));
    assert_eq!(source.list_calls(), 0);
    assert_eq!(store.mutating_calls(), 0);
}

#[tokio::test]
async fn rejected_destination_credentials_abort_in_simulate_too() {
    let source = three_file_source().await;
    let store = Arc::new(InMemoryBlobStore::new());
    store.reject_credentials().await;

    let err = workflow(&source, &store, RunMode::Simulate)
        .run()
        .await
        .expect_err("auth failure");

    assert!(matches!(
        err,
        WorkflowError::AuthenticationFailure { service: "destination", .. }
    ));
    assert_eq!(source.list_calls(), 0);
}

#[tokio::test]
async fn denied_container_creation_is_fatal_in_execute() {
    let source = three_file_source().await;
    let store = Arc::new(InMemoryBlobStore::new());
    store.deny_create().await;

    let err = workflow(&source, &store, RunMode::Execute)
        .run()
        .await
        .expect_err("destination unavailable");

    assert!(matches!(err, WorkflowError::DestinationUnavailable { .. }));
    assert_eq!(source.download_calls(), 0);
    assert_eq!(source.len().await, 4);
}

#[tokio::test]
async fn listing_failure_is_fatal() {
    let source = three_file_source().await;
    source.fail_listing().await;
    let store = Arc::new(InMemoryBlobStore::new());

    let err = workflow(&source, &store, RunMode::Execute)
        .run()
        .await
        .expect_err("listing failure");

    assert!(matches!(err, WorkflowError::ListingFailure(_)));
    assert_eq!(source.download_calls(), 0);
    assert_eq!(store.put_calls(), 0);
}

#[tokio::test]
async fn truncated_plan_is_flagged() {
    let source = three_file_source().await;
    let store = Arc::new(InMemoryBlobStore::new());
    let mut settings = MigrationSettings::new(BUCKET, REGION);
    settings.max_files = 2;
    settings.page_size = 1;
    let migration =
        MigrationWorkflow::new(source.clone(), store.clone(), settings, RunMode::Simulate);

    let job = migration.plan().await.expect("plan");
    assert_eq!(job.files.len(), 2);
    assert!(job.truncated);
}
