//! In-memory registry of symmetric keys.
//!
//! Keys are addressed by `(feed, object index)`. The store has no
//! persistence: its lifetime is that of the graph instance that owns it, and
//! it is handed to every operation explicitly rather than living in a global.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::crypto::{CipherKind, SymmetricKey};
use crate::types::{FeedId, ObjectRef};

/// Mapping from `(feed, index)` to key material.
///
/// Guarded by a `RwLock` so that a registration completes before any later
/// lookup on another task observes the map.
#[derive(Debug, Default)]
pub struct KeyStore {
    keys: RwLock<HashMap<ObjectRef, SymmetricKey>>,
}

impl KeyStore {
    /// Create an empty key store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate fresh key material for `kind`.
    pub fn generate(kind: CipherKind) -> SymmetricKey {
        SymmetricKey::generate(kind)
    }

    /// Register (or replace) the key for `(feed, index)`.
    pub fn register(&self, key: SymmetricKey, feed: FeedId, index: u64) {
        let mut keys = self.keys.write().unwrap_or_else(PoisonError::into_inner);
        keys.insert(ObjectRef::new(feed, index), key);
    }

    /// Look up the key for `(feed, index)`.
    pub fn get(&self, feed: &FeedId, index: u64) -> Option<SymmetricKey> {
        let keys = self.keys.read().unwrap_or_else(PoisonError::into_inner);
        keys.get(&ObjectRef::new(*feed, index)).cloned()
    }

    /// Check whether a key is registered for `(feed, index)`.
    pub fn has(&self, feed: &FeedId, index: u64) -> bool {
        let keys = self.keys.read().unwrap_or_else(PoisonError::into_inner);
        keys.contains_key(&ObjectRef::new(*feed, index))
    }

    /// Forget the key for `(feed, index)`, returning it if present.
    pub fn unregister(&self, feed: &FeedId, index: u64) -> Option<SymmetricKey> {
        let mut keys = self.keys.write().unwrap_or_else(PoisonError::into_inner);
        keys.remove(&ObjectRef::new(*feed, index))
    }

    /// Number of registered keys.
    pub fn len(&self) -> usize {
        self.keys.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
