//! Error types for the store module.

use sealgraph_core::FeedId;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The feed advanced past the length the writer expected.
    #[error("conflict on feed {feed}: expected length {expected}, found {actual}")]
    Conflict {
        feed: FeedId,
        expected: u64,
        actual: u64,
    },

    /// Invalid data in storage or in an append request.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// A blocking storage task did not complete.
    #[error("storage task failed: {0}")]
    Task(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
