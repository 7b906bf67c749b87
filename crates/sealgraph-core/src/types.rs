//! Strong type definitions for SealGraph.
//!
//! Identifiers are newtypes to prevent misuse at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::crypto::Ed25519PublicKey;

/// A 32-byte feed identifier.
///
/// A feed is an append-only log of blocks owned by a single author. The id is
/// derived from Blake3(domain || author || ":" || feed_name), so one author can
/// own any number of feeds.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeedId(pub [u8; 32]);

impl FeedId {
    /// Derive a feed ID from author and feed name.
    pub fn derive(author: &Ed25519PublicKey, feed_name: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"sealgraph-feed-v0:");
        hasher.update(&author.0);
        hasher.update(b":");
        hasher.update(feed_name.as_bytes());
        Self(*hasher.finalize().as_bytes())
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FeedId({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for FeedId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for FeedId {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for FeedId {
    type Error = std::array::TryFromSliceError;

    fn try_from(slice: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; 32] = slice.try_into()?;
        Ok(Self(arr))
    }
}

/// Address of a single object inside a feed: `(feed, object index)`.
///
/// This is the identity under which symmetric keys are registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectRef {
    pub feed: FeedId,
    pub index: u64,
}

impl ObjectRef {
    pub const fn new(feed: FeedId, index: u64) -> Self {
        Self { feed, index }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.feed, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;

    #[test]
    fn test_feed_id_hex_roundtrip() {
        let id = FeedId::from_bytes([0x42; 32]);
        let recovered = FeedId::from_hex(&id.to_hex()).unwrap();
        assert_eq!(id, recovered);
    }

    #[test]
    fn test_feed_id_display() {
        let id = FeedId::from_bytes([0xab; 32]);
        assert_eq!(format!("{}", id), "abababababababab");
    }

    #[test]
    fn test_feed_id_derivation_separates_names() {
        let keypair = Keypair::from_seed(&[0x01; 32]);
        let a = FeedId::derive(&keypair.public_key(), "default");
        let b = FeedId::derive(&keypair.public_key(), "shares");
        assert_ne!(a, b);
        assert_eq!(a, FeedId::derive(&keypair.public_key(), "default"));
    }

    #[test]
    fn test_object_ref_display() {
        let obj = ObjectRef::new(FeedId::from_bytes([0xcd; 32]), 7);
        assert_eq!(obj.to_string(), "cdcdcdcdcdcdcdcd@7");
    }
}
