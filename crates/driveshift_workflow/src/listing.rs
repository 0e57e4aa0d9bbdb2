use driveshift_contract::{FilePage, ListQuery, RemoteFile};
use driveshift_source::{SourceError, SourceService};
use tracing::{debug, warn};

/// Files gathered across every page of a listing.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub files: Vec<RemoteFile>,
    pub total_bytes: u64,
    /// More matches may exist beyond `max_files`.
    pub truncated: bool,
    pub pages: usize,
}

/// Follows page tokens until the listing is exhausted or `max_files` is reached.
pub async fn collect_matching(
    source: &dyn SourceService,
    query: &ListQuery,
    max_files: usize,
) -> Result<Listing, SourceError> {
    let mut listing = Listing::default();
    let mut page_token: Option<String> = None;

    loop {
        let FilePage {
            files,
            next_page_token,
        } = source.list_page(query, page_token.as_deref()).await?;
        listing.pages += 1;
        debug!(page = listing.pages, returned = files.len(), "listing page received");

        for file in files {
            if listing.files.len() >= max_files {
                listing.truncated = true;
                break;
            }
            listing.total_bytes += file.billable_bytes();
            listing.files.push(file);
        }

        match next_page_token {
            Some(_) if listing.truncated || listing.files.len() >= max_files => {
                listing.truncated = true;
                break;
            }
            Some(token) => page_token = Some(token),
            None => break,
        }
    }

    if listing.truncated {
        warn!(
            max_files,
            collected = listing.files.len(),
            "listing capped before exhausting source; more matching files exist"
        );
    }
    Ok(listing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use driveshift_contract::FilePredicate;
    use driveshift_source::InMemorySource;

    async fn seeded(count: u64) -> InMemorySource {
        let source = InMemorySource::new();
        for i in 0..count {
            source
                .insert(
                    RemoteFile {
                        id: format!("f{i:03}"),
                        name: format!("export-{i}.csv"),
                        size: if i % 2 == 0 { Some(100) } else { None },
                        mime_type: Some("text/csv".to_string()),
                        created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
                        modified_at: None,
                        trashed: false,
                    },
                    Vec::new(),
                )
                .await;
        }
        source
    }

    #[tokio::test]
    async fn walks_every_page() {
        let source = seeded(7).await;
        let query = ListQuery::new(FilePredicate::csv_exports()).with_page_size(3);

        let listing = collect_matching(&source, &query, 100).await.expect("listing");
        assert_eq!(listing.files.len(), 7);
        assert_eq!(listing.pages, 3);
        assert_eq!(listing.total_bytes, 400);
        assert!(!listing.truncated);
    }

    #[tokio::test]
    async fn cap_sets_truncated_flag() {
        let source = seeded(7).await;
        let query = ListQuery::new(FilePredicate::csv_exports()).with_page_size(3);

        let listing = collect_matching(&source, &query, 5).await.expect("listing");
        assert_eq!(listing.files.len(), 5);
        assert!(listing.truncated);
    }

    #[tokio::test]
    async fn cap_equal_to_total_is_not_truncated() {
        let source = seeded(6).await;
        let query = ListQuery::new(FilePredicate::csv_exports()).with_page_size(3);

        let listing = collect_matching(&source, &query, 6).await.expect("listing");
        assert_eq!(listing.files.len(), 6);
        assert!(!listing.truncated);
    }
}
