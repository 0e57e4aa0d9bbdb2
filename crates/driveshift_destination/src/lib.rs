pub mod gcs;
pub mod memory;
pub mod store;

pub use gcs::{GcsClient, GcsConfig};
pub use memory::{InMemoryBlobStore, StoredBlob};
pub use store::{BlobStore, BlobStoreError};
