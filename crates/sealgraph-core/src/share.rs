//! The capability payload.
//!
//! A share vertex holds a [`ShareObject`] and exactly one outgoing edge
//! labelled [`SHARE_LABEL`]. That edge carries the target's key, feed and
//! version pin; resolving the share through [`SHARE_VIEW`] redirects to the
//! target unless the share has been revoked.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Type tag of share content.
pub const SHARE_OBJECT: &str = "Share";

/// Name of the view strategy that resolves shares.
pub const SHARE_VIEW: &str = "ShareView";

/// Label of the edge from a share vertex to its target.
pub const SHARE_LABEL: &str = "share";

/// Capability object content. Absent fields are omitted on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub revoked: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl ShareObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked
    }

    /// Serialize to CBOR bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf).map_err(|e| CoreError::Encoding(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize from CBOR bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes).map_err(|e| CoreError::Decoding(e.to_string()))
    }
}
