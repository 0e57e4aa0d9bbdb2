use std::fmt;

use driveshift_contract::RemoteFile;
use driveshift_source::SourceError;
use serde::Serialize;
use thiserror::Error;

/// Errors that abort a whole run. Per-file problems are [`FileFailure`]s instead.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("authentication with the {service} service failed: {reason}")]
    AuthenticationFailure {
        service: &'static str,
        reason: String,
    },
    #[error("listing source files failed: {0}")]
    ListingFailure(#[source] SourceError),
    #[error("destination container {container} is unavailable: {reason}")]
    DestinationUnavailable { container: String, reason: String },
}

impl WorkflowError {
    pub(crate) fn source_auth(error: impl fmt::Display) -> Self {
        WorkflowError::AuthenticationFailure {
            service: "source",
            reason: error.to_string(),
        }
    }

    pub(crate) fn destination_auth(error: impl fmt::Display) -> Self {
        WorkflowError::AuthenticationFailure {
            service: "destination",
            reason: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransferStep {
    Download,
    Upload,
    Delete,
}

impl fmt::Display for TransferStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransferStep::Download => "download",
            TransferStep::Upload => "upload",
            TransferStep::Delete => "delete",
        })
    }
}

/// A single file whose transfer stopped at `step`. The run carries on.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FileFailure {
    pub file_id: String,
    pub name: String,
    pub step: TransferStep,
    pub reason: String,
}

impl FileFailure {
    pub fn new(file: &RemoteFile, step: TransferStep, error: impl fmt::Display) -> Self {
        Self {
            file_id: file.id.clone(),
            name: file.name.clone(),
            step,
            reason: error.to_string(),
        }
    }
}

impl fmt::Display for FileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) failed at {}: {}", self.name, self.file_id, self.step, self.reason)
    }
}
