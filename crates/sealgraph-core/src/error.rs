//! Error types for SealGraph core.

use thiserror::Error;

/// Core errors that can occur while sealing, opening or decoding records.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid key length: expected 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    #[error("unknown cipher kind: {0}")]
    UnknownCipher(u64),

    #[error("encryption error: {0}")]
    Encryption(String),

    /// The AEAD tag did not verify.
    #[error("record failed authentication")]
    Unauthenticated,

    /// The trailing checksum does not match the recomputed one.
    #[error("record checksum mismatch: stored {stored:08x}, computed {computed:08x}")]
    ChecksumMismatch { stored: u32, computed: u32 },

    /// The record is too short to even carry a checksum.
    #[error("truncated record: {len} bytes")]
    TruncatedRecord { len: usize },

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("decoding error: {0}")]
    Decoding(String),

    /// The vertex has no id or feed yet.
    #[error("vertex has not been persisted")]
    NotPersisted,
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
