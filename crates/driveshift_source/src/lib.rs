pub mod drive;
pub mod memory;
pub mod service;

pub use drive::{DriveClient, DriveConfig};
pub use memory::InMemorySource;
pub use service::{SourceError, SourceService};
