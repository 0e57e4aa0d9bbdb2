use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::file::RemoteFile;

/// Largest page the source listing accepts.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Selects the files in scope for a run.
///
/// A file matches when its MIME type is one of `mime_types` or its name
/// contains one of `name_contains`. Both lists empty selects every file.
/// `created_before` and the trashed check narrow that selection further.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilePredicate {
    #[serde(default)]
    pub mime_types: Vec<String>,
    #[serde(default)]
    pub name_contains: Vec<String>,
    #[serde(default)]
    pub created_before: Option<DateTime<Utc>>,
    #[serde(default)]
    pub include_trashed: bool,
}

impl FilePredicate {
    pub fn csv_exports() -> Self {
        Self {
            mime_types: vec!["text/csv".to_string()],
            name_contains: vec![".csv".to_string()],
            ..Self::default()
        }
    }

    pub fn created_before(mut self, cutoff: DateTime<Utc>) -> Self {
        self.created_before = Some(cutoff);
        self
    }

    /// Renders the predicate in the source service's query language.
    pub fn to_query_string(&self) -> Option<String> {
        let mut clauses = Vec::new();

        let selectors: Vec<String> = self
            .mime_types
            .iter()
            .map(|mime| format!("mimeType = '{}'", escape_literal(mime)))
            .chain(
                self.name_contains
                    .iter()
                    .map(|needle| format!("name contains '{}'", escape_literal(needle))),
            )
            .collect();

        match selectors.len() {
            0 => {}
            1 => clauses.push(selectors[0].clone()),
            _ => clauses.push(format!("({})", selectors.join(" or "))),
        }

        if let Some(cutoff) = self.created_before {
            clauses.push(format!(
                "createdTime < '{}'",
                cutoff.to_rfc3339_opts(SecondsFormat::Secs, true)
            ));
        }

        if !self.include_trashed {
            clauses.push("trashed = false".to_string());
        }

        if clauses.is_empty() {
            None
        } else {
            Some(clauses.join(" and "))
        }
    }

    /// Local evaluation with the same semantics as [`Self::to_query_string`].
    /// Name matching is a plain substring test.
    pub fn matches(&self, file: &RemoteFile) -> bool {
        let selected = if self.mime_types.is_empty() && self.name_contains.is_empty() {
            true
        } else {
            let mime_hit = file
                .mime_type
                .as_deref()
                .is_some_and(|mime| self.mime_types.iter().any(|m| m == mime));
            let name_hit = self
                .name_contains
                .iter()
                .any(|needle| file.name.contains(needle.as_str()));
            mime_hit || name_hit
        };

        if !selected {
            return false;
        }
        if let Some(cutoff) = self.created_before {
            if file.created_at >= cutoff {
                return false;
            }
        }
        self.include_trashed || !file.trashed
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderBy {
    CreatedTime,
    QuotaBytesUsedDesc,
}

impl OrderBy {
    pub fn as_query_param(&self) -> &'static str {
        match self {
            OrderBy::CreatedTime => "createdTime",
            OrderBy::QuotaBytesUsedDesc => "quotaBytesUsed desc",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListQuery {
    pub predicate: FilePredicate,
    pub page_size: u32,
    pub order_by: Option<OrderBy>,
}

impl ListQuery {
    pub fn new(predicate: FilePredicate) -> Self {
        Self {
            predicate,
            page_size: MAX_PAGE_SIZE,
            order_by: None,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn ordered_by(mut self, order_by: OrderBy) -> Self {
        self.order_by = Some(order_by);
        self
    }
}

fn escape_literal(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('\'', "\\'")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn file(name: &str, mime: Option<&str>, day: u32, trashed: bool) -> RemoteFile {
        RemoteFile {
            id: name.to_string(),
            name: name.to_string(),
            size: Some(10),
            mime_type: mime.map(str::to_string),
            created_at: Utc.with_ymd_and_hms(2025, 5, day, 0, 0, 0).unwrap(),
            modified_at: None,
            trashed,
        }
    }

    #[test]
    fn csv_predicate_renders_drive_query() {
        let query = FilePredicate::csv_exports().to_query_string();
        assert_eq!(
            query.as_deref(),
            Some("(mimeType = 'text/csv' or name contains '.csv') and trashed = false")
        );
    }

    #[test]
    fn cutoff_and_trashed_clauses_are_joined() {
        let cutoff = Utc.with_ymd_and_hms(2025, 5, 10, 8, 30, 0).unwrap();
        let predicate = FilePredicate {
            mime_types: vec!["text/csv".to_string()],
            include_trashed: true,
            ..FilePredicate::default()
        }
        .created_before(cutoff);

        assert_eq!(
            predicate.to_query_string().as_deref(),
            Some("mimeType = 'text/csv' and createdTime < '2025-05-10T08:30:00Z'")
        );
    }

    #[test]
    fn literals_are_escaped() {
        let predicate = FilePredicate {
            name_contains: vec!["o'brien\\x".to_string()],
            include_trashed: true,
            ..FilePredicate::default()
        };
        assert_eq!(
            predicate.to_query_string().as_deref(),
            Some("name contains 'o\\'brien\\\\x'")
        );
    }

    #[test]
    fn empty_predicate_with_trash_selects_everything() {
        let predicate = FilePredicate {
            include_trashed: true,
            ..FilePredicate::default()
        };
        assert_eq!(predicate.to_query_string(), None);
        assert!(predicate.matches(&file("notes.txt", None, 1, true)));
    }

    #[test]
    fn local_matching_follows_query_semantics() {
        let cutoff = Utc.with_ymd_and_hms(2025, 5, 10, 0, 0, 0).unwrap();
        let predicate = FilePredicate::csv_exports().created_before(cutoff);

        assert!(predicate.matches(&file("a.csv", None, 1, false)));
        assert!(predicate.matches(&file("export", Some("text/csv"), 2, false)));
        assert!(!predicate.matches(&file("a.csv", None, 10, false)));
        assert!(!predicate.matches(&file("a.csv", None, 1, true)));
        assert!(!predicate.matches(&file("report.pdf", Some("application/pdf"), 1, false)));
    }

    #[test]
    fn page_size_is_clamped() {
        let query = ListQuery::new(FilePredicate::default()).with_page_size(5000);
        assert_eq!(query.page_size, MAX_PAGE_SIZE);
        let query = ListQuery::new(FilePredicate::default()).with_page_size(0);
        assert_eq!(query.page_size, 1);
    }
}
