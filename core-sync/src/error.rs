use bridge_traits::store::StoreError;
use core_content::ContentError;
use thiserror::Error;

/// Fatal failures of a sync or validation run.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Content error: {0}")]
    Content(#[from] ContentError),

    #[error("Configuration error: {0}")]
    Config(#[from] core_runtime::Error),

    #[error("Remote {operation} on '{table}' failed: {source}")]
    Remote {
        operation: &'static str,
        table: String,
        #[source]
        source: StoreError,
    },

    #[error("Invalid state transition from {from} to {to}: {reason}")]
    InvalidStateTransition {
        from: String,
        to: String,
        reason: String,
    },
}

impl SyncError {
    pub(crate) fn remote(operation: &'static str, table: &str, source: StoreError) -> Self {
        SyncError::Remote {
            operation,
            table: table.to_string(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

/// Content problems confined to one work unit.
///
/// In a sync run these exclude the unit; in a validation run they are
/// collected and reported.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    #[error("Missing required field '{field}'")]
    MissingField { field: &'static str },

    #[error("Invalid id '{value}': must be an integer")]
    InvalidIdentity { value: String },

    #[error("Duplicate episode ID '{id}' ({first} and {second})")]
    DuplicateEpisodeId {
        id: String,
        first: String,
        second: String,
    },
}
