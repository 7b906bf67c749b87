//! CryptoCore: vertices over encrypted transactions.
//!
//! Ties the transaction layer to the key store. Keys for newly created
//! objects are registered only after their commit succeeds, and keys carried
//! on edges are registered as soon as the vertex holding them is read. That
//! second rule is the whole access model: reading a vertex is the only way
//! to learn the keys of its children.

use std::sync::Arc;

use tracing::{debug, warn};

use sealgraph_core::{
    decode_vertex, encode_vertex, CipherKind, CoreError, FeedId, KeyStore, Vertex,
};
use sealgraph_store::BlockStore;

use crate::error::{CryptoError, Result};
use crate::transaction::{CommitReceipt, EncryptedTransaction};

pub struct CryptoCore<S: BlockStore> {
    store: Arc<S>,
    keys: Arc<KeyStore>,
    default_feed: FeedId,
    cipher: CipherKind,
}

impl<S: BlockStore> CryptoCore<S> {
    pub fn new(store: Arc<S>, keys: Arc<KeyStore>, default_feed: FeedId, cipher: CipherKind) -> Self {
        Self {
            store,
            keys,
            default_feed,
            cipher,
        }
    }

    pub fn default_feed(&self) -> FeedId {
        self.default_feed
    }

    pub fn keys(&self) -> &Arc<KeyStore> {
        &self.keys
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn cipher(&self) -> CipherKind {
        self.cipher
    }

    /// Run `body` in a write transaction on `feed` and commit it.
    ///
    /// Keys of objects created by `body` are registered under their assigned
    /// ids once the commit lands. If `body` or the commit fails nothing is
    /// registered.
    pub async fn transaction<T, F>(
        &self,
        feed: FeedId,
        version: Option<u64>,
        body: F,
    ) -> Result<(T, CommitReceipt)>
    where
        F: FnOnce(&mut EncryptedTransaction<S>) -> Result<T> + Send,
        T: Send,
    {
        let mut tx = EncryptedTransaction::open(
            self.store.clone(),
            self.keys.clone(),
            feed,
            version,
            self.cipher,
        )
        .await?;

        let out = body(&mut tx)?;
        let receipt = tx.commit().await?;

        for (id, key) in &receipt.created {
            self.keys.register(key.clone(), feed, *id);
            debug!(%feed, id, "registered key for new object");
        }
        Ok((out, receipt))
    }

    /// Open a read-only transaction on `feed`, optionally pinned to `version`.
    pub async fn open_transaction(
        &self,
        feed: FeedId,
        version: Option<u64>,
    ) -> Result<EncryptedTransaction<S>> {
        EncryptedTransaction::open_read_only(self.store.clone(), self.keys.clone(), feed, version)
            .await
    }

    /// Read vertex `id` through `tx` and register the keys on its edges.
    ///
    /// A checksum mismatch becomes [`CryptoError::AccessDenied`] even when no
    /// key was applied, since a missing key and a damaged record look the
    /// same. Records too short to hold a checksum, and unkeyed records that
    /// verify but do not decode, stay [`CryptoError::Corrupted`]. A keyed
    /// record that verifies but does not decode is access-denied.
    pub async fn get_in_transaction(
        &self,
        id: u64,
        tx: &EncryptedTransaction<S>,
    ) -> Result<Vertex> {
        let feed = tx.feed();
        let keyed = self.keys.has(&feed, id);
        let plaintext = tx.get(id).await.map_err(|err| match err {
            CryptoError::Corrupted { feed, id, cause }
                if !matches!(cause, CoreError::TruncatedRecord { .. }) =>
            {
                CryptoError::AccessDenied { feed, id, cause }
            }
            other => other,
        });
        let plaintext = match plaintext {
            Ok(bytes) => bytes,
            Err(err) => {
                if let CryptoError::AccessDenied { .. } = err {
                    warn!(%feed, id, "read denied");
                }
                return Err(err);
            }
        };

        let mut vertex = decode_vertex(&plaintext).map_err(|cause| {
            warn!(%feed, id, keyed, "record verified but does not decode");
            if keyed {
                CryptoError::AccessDenied { feed, id, cause }
            } else {
                CryptoError::Corrupted { feed, id, cause }
            }
        })?;
        vertex.mark_persisted(id, feed, tx.version());

        self.register_edges(&vertex);
        Ok(vertex)
    }

    /// Read vertex `id` from `feed` at `version` (latest when `None`).
    pub async fn get_vertex(&self, id: u64, feed: FeedId, version: Option<u64>) -> Result<Vertex> {
        let tx = self.open_transaction(feed, version).await?;
        self.get_in_transaction(id, &tx).await
    }

    /// Register every key embedded in `vertex`'s edges.
    pub fn register_edges(&self, vertex: &Vertex) {
        let source = vertex.feed().unwrap_or(self.default_feed);
        for edge in vertex.edges() {
            if let Some(key) = &edge.metadata.key {
                let feed = edge.feed.unwrap_or(source);
                self.keys.register(key.clone(), feed, edge.target);
                debug!(%feed, target = edge.target, label = %edge.label, "registered key from edge");
            }
        }
    }

    /// Embed the known key of each edge's target, except on enveloped edges.
    ///
    /// The target feed is the edge's own feed, else the vertex's feed, else
    /// the default feed. An edge whose target key is unknown keeps whatever
    /// key it already carries.
    pub fn set_edge_keys(&self, vertex: &mut Vertex) {
        let source = vertex.feed().unwrap_or(self.default_feed);
        self.set_edge_keys_from(vertex, source);
    }

    fn set_edge_keys_from(&self, vertex: &mut Vertex, source: FeedId) {
        for edge in vertex.edges_mut() {
            if edge.metadata.envelope {
                continue;
            }
            let feed = edge.feed.unwrap_or(source);
            if let Some(key) = self.keys.get(&feed, edge.target) {
                edge.metadata.key = Some(key);
            }
        }
    }

    /// Write `vertex`: create it if new, else write a new version.
    ///
    /// New vertices go to `feed` (default feed when `None`). A persisted
    /// vertex is always rewritten in its own feed. On success the vertex's
    /// id, feed and version are updated.
    pub async fn put_vertex(&self, vertex: &mut Vertex, feed: Option<FeedId>) -> Result<CommitReceipt> {
        let target_feed = match (vertex.feed(), feed) {
            (Some(own), Some(requested)) if own != requested => {
                return Err(CryptoError::WrongFeed {
                    vertex_feed: own,
                    requested,
                })
            }
            (Some(own), _) => own,
            (None, requested) => requested.unwrap_or(self.default_feed),
        };

        self.set_edge_keys_from(vertex, target_feed);
        let bytes = encode_vertex(vertex)?;

        let (id, receipt) = match vertex.id() {
            None => {
                self.transaction(target_feed, None, |tx| tx.create(&bytes).map(|(id, _)| id))
                    .await?
            }
            Some(id) => {
                self.transaction(target_feed, None, |tx| tx.set(id, &bytes).map(|_| id))
                    .await?
            }
        };

        vertex.mark_persisted(id, target_feed, receipt.length);
        debug!(feed = %target_feed, id, version = receipt.length, "put vertex");
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sealgraph_core::{Edge, EdgeOptions, SimpleObject, SymmetricKey};
    use sealgraph_core::record::frame;
    use sealgraph_store::{Block, MemoryStore};

    fn core() -> CryptoCore<MemoryStore> {
        CryptoCore::new(
            Arc::new(MemoryStore::new()),
            Arc::new(KeyStore::new()),
            FeedId::from_bytes([0x44; 32]),
            CipherKind::ChaCha20,
        )
    }

    fn simple(text: &str) -> Vertex {
        Vertex::with_content(SimpleObject::new().set("text", text))
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let core = core();
        let mut v = simple("hello");
        let receipt = core.put_vertex(&mut v, None).await.unwrap();

        assert_eq!(v.id(), Some(0));
        assert_eq!(v.feed(), Some(core.default_feed()));
        assert_eq!(v.version(), Some(receipt.length));
        assert!(core.keys().has(&core.default_feed(), 0));

        let read = core.get_vertex(0, core.default_feed(), None).await.unwrap();
        assert_eq!(read.content(), v.content());
        assert_eq!(read.version(), Some(1));
    }

    #[tokio::test]
    async fn test_failed_body_registers_nothing() {
        let core = core();
        let result: Result<((), CommitReceipt)> = core
            .transaction(core.default_feed(), None, |tx| {
                tx.create(b"x")?;
                Err(CryptoError::ReadOnly(tx.feed()))
            })
            .await;
        assert!(result.is_err());
        assert!(core.keys().is_empty());
        assert_eq!(core.store().head(&core.default_feed()).await.unwrap().length, 0);
    }

    #[tokio::test]
    async fn test_evicted_key_is_access_denied() {
        let core = core();
        let mut v = simple("hello");
        core.put_vertex(&mut v, None).await.unwrap();
        let (id, feed) = v.address().unwrap();

        core.keys().unregister(&feed, id);
        assert!(matches!(
            core.get_vertex(id, feed, None).await,
            Err(CryptoError::AccessDenied { .. })
        ));
    }

    #[tokio::test]
    async fn test_edge_keys_embedded_and_registered_on_read() {
        let core = core();
        let mut child = simple("child");
        core.put_vertex(&mut child, None).await.unwrap();
        let child_key = core.keys().get(&child.feed().unwrap(), 0).unwrap();

        let mut parent = simple("parent");
        parent.add_edge_to(&child, "child").unwrap();
        core.put_vertex(&mut parent, None).await.unwrap();
        assert_eq!(parent.edges()[0].metadata.key.as_ref(), Some(&child_key));

        // Forget the child key; reading the parent brings it back.
        core.keys().unregister(&child.feed().unwrap(), 0);
        core.get_vertex(parent.id().unwrap(), parent.feed().unwrap(), None)
            .await
            .unwrap();
        assert_eq!(core.keys().get(&child.feed().unwrap(), 0), Some(child_key));
    }

    #[tokio::test]
    async fn test_enveloped_edge_carries_no_key() {
        let core = core();
        let mut child = simple("child");
        core.put_vertex(&mut child, None).await.unwrap();

        let mut parent = simple("parent");
        parent
            .add_edge_to_with(
                &child,
                "private",
                EdgeOptions {
                    envelope: true,
                    ..Default::default()
                },
            )
            .unwrap();
        core.put_vertex(&mut parent, None).await.unwrap();
        assert!(parent.edges()[0].metadata.key.is_none());
    }

    #[tokio::test]
    async fn test_unknown_target_keeps_existing_key() {
        let core = core();
        let manual = SymmetricKey::from_bytes(CipherKind::ChaCha20, [5; 32]);
        let mut v = simple("v");
        v.add_edge(Edge::new("elsewhere", 9).with_key(manual.clone()));

        core.set_edge_keys(&mut v);
        assert_eq!(v.edges()[0].metadata.key.as_ref(), Some(&manual));
    }

    #[tokio::test]
    async fn test_update_keeps_id_and_key() {
        let core = core();
        let mut v = simple("v1");
        core.put_vertex(&mut v, None).await.unwrap();
        let key = core.keys().get(&core.default_feed(), 0).unwrap();

        v.set_content(SimpleObject::new().set("text", "v2"));
        core.put_vertex(&mut v, None).await.unwrap();
        assert_eq!(v.id(), Some(0));
        assert_eq!(v.version(), Some(2));
        assert_eq!(core.keys().get(&core.default_feed(), 0), Some(key));

        let latest = core.get_vertex(0, core.default_feed(), None).await.unwrap();
        assert_eq!(
            latest.content().and_then(|c| c.as_simple()).and_then(|s| s.get("text")),
            Some("v2")
        );
        let old = core.get_vertex(0, core.default_feed(), Some(1)).await.unwrap();
        assert_eq!(
            old.content().and_then(|c| c.as_simple()).and_then(|s| s.get("text")),
            Some("v1")
        );
    }

    #[tokio::test]
    async fn test_rewrite_in_other_feed_rejected() {
        let core = core();
        let mut v = simple("v");
        core.put_vertex(&mut v, None).await.unwrap();

        let other = FeedId::from_bytes([0x55; 32]);
        assert!(matches!(
            core.put_vertex(&mut v, Some(other)).await,
            Err(CryptoError::WrongFeed { .. })
        ));
    }

    #[tokio::test]
    async fn test_put_in_named_feed() {
        let core = core();
        let other = FeedId::from_bytes([0x55; 32]);
        let mut v = simple("v");
        core.put_vertex(&mut v, Some(other)).await.unwrap();
        assert_eq!(v.feed(), Some(other));
        assert!(core.get_vertex(0, other, None).await.is_ok());
        assert!(matches!(
            core.get_vertex(0, core.default_feed(), None).await,
            Err(CryptoError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_rewrite_without_key_is_refused() {
        let core = core();
        let mut child = simple("child");
        core.put_vertex(&mut child, None).await.unwrap();
        let mut parent = simple("parent");
        parent.add_edge_to(&child, "c").unwrap();
        core.put_vertex(&mut parent, None).await.unwrap();
        let (id, feed) = parent.address().unwrap();
        let length = core.store().head(&feed).await.unwrap().length;

        core.keys().unregister(&feed, id);
        assert!(matches!(
            core.put_vertex(&mut parent, None).await,
            Err(CryptoError::KeyNotFound { .. })
        ));
        assert_eq!(core.store().head(&feed).await.unwrap().length, length);
    }

    #[tokio::test]
    async fn test_truncated_record_is_corrupted() {
        let core = core();
        let feed = core.default_feed();
        core.store()
            .append_blocks(&feed, 0, vec![Block::new(0, vec![0x01, 0x02])])
            .await
            .unwrap();
        assert!(matches!(
            core.get_vertex(0, feed, None).await,
            Err(CryptoError::Corrupted { .. })
        ));
    }

    #[tokio::test]
    async fn test_unkeyed_record_that_does_not_decode_is_corrupted() {
        let core = core();
        let feed = core.default_feed();
        core.store()
            .append_blocks(&feed, 0, vec![Block::new(0, frame(b"\xff\xfe"))])
            .await
            .unwrap();
        assert!(matches!(
            core.get_vertex(0, feed, None).await,
            Err(CryptoError::Corrupted { .. })
        ));

        // The same bytes read under a key are a wrong-key condition.
        core.keys()
            .register(SymmetricKey::generate(CipherKind::ChaCha20), feed, 0);
        assert!(matches!(
            core.get_vertex(0, feed, None).await,
            Err(CryptoError::AccessDenied { .. })
        ));
    }
}
