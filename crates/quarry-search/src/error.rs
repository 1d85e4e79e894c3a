use quarry_core::Cancelled;
use quarry_index::IndexError;

/// Errors that abort a whole query.
///
/// Only cancellation and collaborator failures are fatal; resolution gaps and
/// key-shape mismatches degrade individual candidates instead.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("search cancelled")]
    Cancelled(#[from] Cancelled),

    #[error("index failure: {0}")]
    Index(#[from] IndexError),
}
