//! Error types for the encrypted transaction layer.

use sealgraph_core::{CoreError, FeedId};
use sealgraph_store::StoreError;
use thiserror::Error;

/// Errors that can occur while reading or writing sealed records.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// A key was applied and the record still did not verify, or the
    /// verified bytes did not decode as a vertex.
    #[error("access denied to {feed}@{id}: {cause}")]
    AccessDenied {
        feed: FeedId,
        id: u64,
        #[source]
        cause: CoreError,
    },

    /// The stored bytes are damaged and no key was involved.
    #[error("corrupted record {feed}@{id}: {cause}")]
    Corrupted {
        feed: FeedId,
        id: u64,
        #[source]
        cause: CoreError,
    },

    /// No block for this object at or below the transaction head.
    #[error("object not found: {feed}@{id}")]
    NotFound { feed: FeedId, id: u64 },

    /// A rewrite of an object whose key is not registered.
    #[error("no key registered for {feed}@{id}")]
    KeyNotFound { feed: FeedId, id: u64 },

    /// Another writer advanced the feed since the transaction opened.
    #[error("feed {feed} moved: expected length {expected}, found {actual}")]
    HeadMoved {
        feed: FeedId,
        expected: u64,
        actual: u64,
    },

    /// Writes are not allowed on this transaction.
    #[error("transaction on {0} is read-only")]
    ReadOnly(FeedId),

    /// A pinned version beyond the end of the feed.
    #[error("version {version} is past the end of feed {feed} (length {length})")]
    VersionOutOfRange {
        feed: FeedId,
        version: u64,
        length: u64,
    },

    /// A persisted vertex can only be rewritten in its own feed.
    #[error("vertex lives in feed {vertex_feed}, not {requested}")]
    WrongFeed {
        vertex_feed: FeedId,
        requested: FeedId,
    },

    /// Storage error.
    #[error("storage error: {0}")]
    Store(StoreError),

    /// Core error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),
}

impl From<StoreError> for CryptoError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict {
                feed,
                expected,
                actual,
            } => CryptoError::HeadMoved {
                feed,
                expected,
                actual,
            },
            other => CryptoError::Store(other),
        }
    }
}

/// Result type for transaction operations.
pub type Result<T> = std::result::Result<T, CryptoError>;
