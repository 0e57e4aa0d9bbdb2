use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type FileId = String;

pub const GOOGLE_DOCUMENT_MIME: &str = "application/vnd.google-apps.document";
pub const GOOGLE_SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

/// File metadata as reported by the source listing. Never mutated locally.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteFile {
    pub id: FileId,
    pub name: String,
    /// Absent for native documents, which have no byte content of their own.
    pub size: Option<u64>,
    pub mime_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub trashed: bool,
}

impl RemoteFile {
    pub fn billable_bytes(&self) -> u64 {
        self.size.unwrap_or(0)
    }

    pub fn is_document(&self) -> bool {
        self.mime_type.as_deref() == Some(GOOGLE_DOCUMENT_MIME)
    }

    pub fn is_spreadsheet(&self) -> bool {
        self.mime_type.as_deref() == Some(GOOGLE_SPREADSHEET_MIME)
    }
}

/// One page of a source listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilePage {
    pub files: Vec<RemoteFile>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageQuota {
    /// `None` means the account has no fixed limit.
    pub limit: Option<u64>,
    pub usage: u64,
    pub usage_in_drive: u64,
    pub usage_in_trash: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountInfo {
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub quota: StorageQuota,
}

/// Blob key a migrated file lands under. Two files with the same name map to
/// the same key and the later upload wins.
pub fn destination_key(prefix: &str, file_name: &str) -> String {
    format!("{prefix}{file_name}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample(size: Option<u64>) -> RemoteFile {
        RemoteFile {
            id: "f1".to_string(),
            name: "export.csv".to_string(),
            size,
            mime_type: Some("text/csv".to_string()),
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
            modified_at: None,
            trashed: false,
        }
    }

    #[test]
    fn unknown_size_bills_zero() {
        assert_eq!(sample(None).billable_bytes(), 0);
        assert_eq!(sample(Some(42)).billable_bytes(), 42);
    }

    #[test]
    fn destination_key_prepends_prefix() {
        assert_eq!(
            destination_key("csv-exports/", "jobs 2025.csv"),
            "csv-exports/jobs 2025.csv"
        );
        assert_eq!(destination_key("", "a.csv"), "a.csv");
    }

    #[test]
    fn trashed_defaults_to_false_when_missing() {
        let file: RemoteFile = serde_json::from_str(
            r#"{"id":"x","name":"n","size":null,"mime_type":null,"created_at":"2025-01-01T00:00:00Z","modified_at":null}"#,
        )
        .expect("decode");
        assert!(!file.trashed);
    }
}
