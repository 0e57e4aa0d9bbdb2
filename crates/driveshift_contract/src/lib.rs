pub mod file;
pub mod query;

pub use file::{destination_key, AccountInfo, FilePage, RemoteFile, StorageQuota};
pub use query::{FilePredicate, ListQuery, OrderBy, MAX_PAGE_SIZE};
