//! Vertex content payloads.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::share::ShareObject;

/// Type tag of [`SimpleObject`] content.
pub const SIMPLE_OBJECT: &str = "Simple";

/// A plain string map, the default payload for application vertices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleObject(BTreeMap<String, String>);

impl SimpleObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Polymorphic vertex content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Simple(SimpleObject),
    Share(ShareObject),
    /// Host-defined payload, carried as opaque bytes under its type tag.
    Custom { type_name: String, data: Vec<u8> },
}

impl Content {
    /// The type tag written next to the payload.
    pub fn type_name(&self) -> &str {
        match self {
            Content::Simple(_) => SIMPLE_OBJECT,
            Content::Share(_) => crate::share::SHARE_OBJECT,
            Content::Custom { type_name, .. } => type_name,
        }
    }

    /// Serialize the payload (without the type tag).
    pub fn encode(&self) -> Result<Vec<u8>> {
        match self {
            Content::Simple(obj) => {
                let mut buf = Vec::new();
                ciborium::into_writer(obj, &mut buf)
                    .map_err(|e| CoreError::Encoding(e.to_string()))?;
                Ok(buf)
            }
            Content::Share(share) => share.to_bytes(),
            Content::Custom { data, .. } => Ok(data.clone()),
        }
    }

    /// Deserialize a payload given its type tag.
    pub fn decode(type_name: &str, bytes: &[u8]) -> Result<Self> {
        match type_name {
            SIMPLE_OBJECT => ciborium::from_reader(bytes)
                .map(Content::Simple)
                .map_err(|e| CoreError::Decoding(e.to_string())),
            crate::share::SHARE_OBJECT => ShareObject::from_bytes(bytes).map(Content::Share),
            other => Ok(Content::Custom {
                type_name: other.to_string(),
                data: bytes.to_vec(),
            }),
        }
    }

    pub fn as_simple(&self) -> Option<&SimpleObject> {
        match self {
            Content::Simple(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_share(&self) -> Option<&ShareObject> {
        match self {
            Content::Share(share) => Some(share),
            _ => None,
        }
    }

    pub fn as_share_mut(&mut self) -> Option<&mut ShareObject> {
        match self {
            Content::Share(share) => Some(share),
            _ => None,
        }
    }
}

impl From<SimpleObject> for Content {
    fn from(obj: SimpleObject) -> Self {
        Content::Simple(obj)
    }
}

impl From<ShareObject> for Content {
    fn from(share: ShareObject) -> Self {
        Content::Share(share)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_object_accessors() {
        let obj = SimpleObject::new().set("greeting", "hello");
        assert_eq!(obj.get("greeting"), Some("hello"));
        assert_eq!(obj.get("missing"), None);
        assert_eq!(obj.len(), 1);
    }

    #[test]
    fn test_decode_dispatches_on_type() {
        let simple = Content::Simple(SimpleObject::new().set("k", "v"));
        let bytes = simple.encode().unwrap();
        assert_eq!(Content::decode(SIMPLE_OBJECT, &bytes).unwrap(), simple);

        let custom = Content::decode("Blob", b"\x00\x01").unwrap();
        assert_eq!(custom.type_name(), "Blob");
        assert_eq!(custom.encode().unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_simple_decode_rejects_garbage() {
        assert!(Content::decode(SIMPLE_OBJECT, &[0xff, 0x00, 0x13]).is_err());
    }
}
