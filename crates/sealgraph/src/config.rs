//! Graph configuration.

use sealgraph_core::CipherKind;

/// Configuration for a [`CapabilityGraph`](crate::CapabilityGraph).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphConfig {
    /// Name of the feed new vertices go to unless told otherwise.
    pub default_feed_name: String,
    /// Cipher for keys generated by this instance.
    pub cipher: CipherKind,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            default_feed_name: "default".to_string(),
            cipher: CipherKind::ChaCha20,
        }
    }
}

impl GraphConfig {
    pub fn with_default_feed(mut self, name: impl Into<String>) -> Self {
        self.default_feed_name = name.into();
        self
    }

    pub fn with_cipher(mut self, cipher: CipherKind) -> Self {
        self.cipher = cipher;
        self
    }
}
