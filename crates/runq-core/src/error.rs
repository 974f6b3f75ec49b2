use thiserror::Error;

use runq_model::{ItemError, PositionParseError};
use runq_store::StoreError;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("item with uid '{0}' is already in the queue")]
    Duplicate(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("the queue is empty")]
    EmptyQueue,

    /// A targeted single-record removal matched zero or several records.
    /// Signals store or record corruption, not a caller error.
    #[error("expected to remove exactly one matching record, removed {0}")]
    InconsistentRemoval(usize),

    /// A relative insert found no record matching its pivot value.
    #[error("insert pivot vanished from the queue")]
    PivotVanished,

    #[error("invalid stored record: {0}")]
    Record(#[from] ItemError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<PositionParseError> for QueueError {
    fn from(err: PositionParseError) -> Self {
        QueueError::InvalidArgument(err.to_string())
    }
}
