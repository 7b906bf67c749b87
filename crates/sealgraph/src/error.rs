//! Error types for the graph.

use sealgraph_core::{CoreError, FeedId};
use sealgraph_crypto::CryptoError;
use sealgraph_store::StoreError;
use thiserror::Error;

/// Errors that can occur during graph operations.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The vertex could not be opened with the keys at hand.
    #[error("access denied to vertex {feed}@{id}")]
    AccessDenied {
        feed: FeedId,
        id: u64,
        #[source]
        cause: CoreError,
    },

    /// The stored record is damaged.
    #[error("corrupted vertex {feed}@{id}")]
    Corrupted {
        feed: FeedId,
        id: u64,
        #[source]
        cause: CoreError,
    },

    /// A share vertex without a usable share edge.
    #[error("malformed capability {feed}@{id}: {reason}")]
    MalformedCapability {
        feed: FeedId,
        id: u64,
        reason: String,
    },

    /// The share has been revoked; its target was not touched.
    #[error("capability {feed}@{id} has been revoked")]
    RevokedCapability { feed: FeedId, id: u64 },

    /// A share view was asked to resolve a vertex that is not a share.
    #[error("vertex {feed}@{id} is not a capability")]
    NotACapability { feed: FeedId, id: u64 },

    /// The vertex has no id or feed yet.
    #[error("vertex has not been persisted")]
    NotPersisted,

    /// No key is registered for the vertex.
    #[error("no key registered for {feed}@{id}")]
    KeyNotFound { feed: FeedId, id: u64 },

    /// No such vertex in the feed (at the requested version).
    #[error("vertex not found: {feed}@{id}")]
    VertexNotFound { feed: FeedId, id: u64 },

    /// No view registered under this name.
    #[error("unknown view: {0}")]
    UnknownView(String),

    /// Another writer advanced the feed first.
    #[error("conflict on feed {feed}: expected length {expected}, found {actual}")]
    Conflict {
        feed: FeedId,
        expected: u64,
        actual: u64,
    },

    /// The operation does not apply to its arguments.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Encoding or key material error.
    #[error("encoding error: {0}")]
    Encoding(CoreError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// Flat classification of [`GraphError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    AccessDenied,
    Corrupted,
    MalformedCapability,
    RevokedCapability,
    NotACapability,
    NotPersisted,
    KeyNotFound,
    VertexNotFound,
    UnknownView,
    Conflict,
    InvalidOperation,
    Encoding,
    Store,
}

impl GraphError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GraphError::AccessDenied { .. } => ErrorKind::AccessDenied,
            GraphError::Corrupted { .. } => ErrorKind::Corrupted,
            GraphError::MalformedCapability { .. } => ErrorKind::MalformedCapability,
            GraphError::RevokedCapability { .. } => ErrorKind::RevokedCapability,
            GraphError::NotACapability { .. } => ErrorKind::NotACapability,
            GraphError::NotPersisted => ErrorKind::NotPersisted,
            GraphError::KeyNotFound { .. } => ErrorKind::KeyNotFound,
            GraphError::VertexNotFound { .. } => ErrorKind::VertexNotFound,
            GraphError::UnknownView(_) => ErrorKind::UnknownView,
            GraphError::Conflict { .. } => ErrorKind::Conflict,
            GraphError::InvalidOperation(_) => ErrorKind::InvalidOperation,
            GraphError::Encoding(_) => ErrorKind::Encoding,
            GraphError::Store(_) => ErrorKind::Store,
        }
    }
}

impl From<CoreError> for GraphError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotPersisted => GraphError::NotPersisted,
            other => GraphError::Encoding(other),
        }
    }
}

impl From<CryptoError> for GraphError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::AccessDenied { feed, id, cause } => {
                GraphError::AccessDenied { feed, id, cause }
            }
            CryptoError::Corrupted { feed, id, cause } => GraphError::Corrupted { feed, id, cause },
            CryptoError::NotFound { feed, id } => GraphError::VertexNotFound { feed, id },
            CryptoError::KeyNotFound { feed, id } => GraphError::KeyNotFound { feed, id },
            CryptoError::HeadMoved {
                feed,
                expected,
                actual,
            } => GraphError::Conflict {
                feed,
                expected,
                actual,
            },
            CryptoError::Store(err) => GraphError::Store(err),
            CryptoError::Core(err) => err.into(),
            other @ (CryptoError::ReadOnly(_)
            | CryptoError::VersionOutOfRange { .. }
            | CryptoError::WrongFeed { .. }) => GraphError::InvalidOperation(other.to_string()),
        }
    }
}

/// Result type for graph operations.
pub type Result<T> = std::result::Result<T, GraphError>;
