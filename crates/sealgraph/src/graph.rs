//! The CapabilityGraph: unified API for SealGraph.
//!
//! Brings together the block store, the key store and the view registry.
//! Every read goes through the key store; every write seals under a per-object
//! key and embeds target keys into edges.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use sealgraph_core::{
    Edge, Ed25519PublicKey, FeedId, KeyStore, Keypair, ShareObject, SymmetricKey, Vertex,
    SHARE_LABEL,
};
use sealgraph_crypto::CryptoCore;
use sealgraph_store::BlockStore;

use crate::config::GraphConfig;
use crate::error::{GraphError, Result};
use crate::query::Query;
use crate::share::ShareOptions;
use crate::view::{View, ViewContext, ViewRegistry};

/// An encrypted graph owned by one author.
pub struct CapabilityGraph<S: BlockStore> {
    keypair: Keypair,
    config: GraphConfig,
    core: CryptoCore<S>,
    views: ViewRegistry,
}

impl<S: BlockStore> CapabilityGraph<S> {
    /// Create a graph with its own, empty key store.
    pub fn new(keypair: Keypair, store: S, config: GraphConfig) -> Self {
        Self::with_keys(keypair, Arc::new(store), Arc::new(KeyStore::new()), config)
    }

    /// Create a graph over a shared store and key store.
    pub fn with_keys(
        keypair: Keypair,
        store: Arc<S>,
        keys: Arc<KeyStore>,
        config: GraphConfig,
    ) -> Self {
        let default_feed = FeedId::derive(&keypair.public_key(), &config.default_feed_name);
        let core = CryptoCore::new(store, keys, default_feed, config.cipher);
        Self {
            keypair,
            config,
            core,
            views: ViewRegistry::default(),
        }
    }

    pub fn public_key(&self) -> Ed25519PublicKey {
        self.keypair.public_key()
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn default_feed(&self) -> FeedId {
        self.core.default_feed()
    }

    /// Another feed owned by this graph's author.
    pub fn feed(&self, name: &str) -> FeedId {
        FeedId::derive(&self.keypair.public_key(), name)
    }

    pub fn keys(&self) -> &Arc<KeyStore> {
        self.core.keys()
    }

    pub fn store(&self) -> &Arc<S> {
        self.core.store()
    }

    pub fn core(&self) -> &CryptoCore<S> {
        &self.core
    }

    /// A fresh, unpersisted vertex.
    pub fn create(&self) -> Vertex {
        Vertex::new()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────────

    /// Read the latest version of vertex `id`.
    ///
    /// `feed` defaults to the default feed. When `key` is given it is
    /// registered for `(feed, id)` first, which is how an out-of-band key
    /// opens an entry point into the graph.
    pub async fn get(
        &self,
        id: u64,
        feed: Option<FeedId>,
        key: Option<SymmetricKey>,
    ) -> Result<Vertex> {
        let feed = feed.unwrap_or_else(|| self.default_feed());
        if let Some(key) = key {
            self.register_vertex_key(id, feed, key);
        }
        Ok(self.core.get_vertex(id, feed, None).await?)
    }

    /// Read vertex `id` as it was when `feed` had length `version`.
    pub async fn get_at(&self, id: u64, feed: FeedId, version: u64) -> Result<Vertex> {
        Ok(self.core.get_vertex(id, feed, Some(version)).await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Writes
    // ─────────────────────────────────────────────────────────────────────────

    /// Persist `vertex`: new vertices go to the default feed.
    pub async fn put(&self, vertex: &mut Vertex) -> Result<()> {
        self.core.put_vertex(vertex, None).await?;
        Ok(())
    }

    /// Persist a new vertex into `feed`.
    pub async fn put_in(&self, vertex: &mut Vertex, feed: FeedId) -> Result<()> {
        self.core.put_vertex(vertex, Some(feed)).await?;
        Ok(())
    }

    /// Persist each vertex in order.
    ///
    /// Each write commits on its own; if one fails, the ones before it stay
    /// written.
    pub async fn put_all(&self, vertices: &mut [Vertex]) -> Result<()> {
        for vertex in vertices.iter_mut() {
            self.put(vertex).await?;
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Keys
    // ─────────────────────────────────────────────────────────────────────────

    /// The key of a persisted vertex.
    pub fn get_key(&self, vertex: &Vertex) -> Result<SymmetricKey> {
        let (id, feed) = vertex.address()?;
        self.keys()
            .get(&feed, id)
            .ok_or(GraphError::KeyNotFound { feed, id })
    }

    /// Register a key obtained outside the graph.
    pub fn register_vertex_key(&self, id: u64, feed: FeedId, key: SymmetricKey) {
        self.keys().register(key, feed, id);
        debug!(%feed, id, "registered vertex key");
    }

    /// Forget the key of `(feed, id)`, returning it if it was known.
    pub fn evict_vertex_key(&self, id: u64, feed: FeedId) -> Option<SymmetricKey> {
        let evicted = self.keys().unregister(&feed, id);
        debug!(%feed, id, evicted = evicted.is_some(), "evicted vertex key");
        evicted
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Shares
    // ─────────────────────────────────────────────────────────────────────────

    /// Persist a new share vertex granting access to `target`.
    ///
    /// The share edge carries the target's key, feed and version, so whoever
    /// can read the share can read the target as it was at that version.
    pub async fn create_share(&self, target: &Vertex, options: ShareOptions) -> Result<Vertex> {
        let (id, feed) = target.address()?;
        let key = self.get_key(target)?;

        let mut edge = Edge::new(SHARE_LABEL, id).with_feed(feed).with_key(key);
        edge.version = target.version();
        edge.view = options.view;

        let mut share = Vertex::with_content(ShareObject {
            version: options.version,
            info: options.info,
            owner: options.owner,
            revoked: false,
        });
        share.add_edge(edge);

        self.put(&mut share).await?;
        debug!(share = ?share.address().ok(), target = %id, "created share");
        Ok(share)
    }

    /// Mark a share revoked and persist it.
    ///
    /// The target is not re-keyed; resolution stops at the share.
    pub async fn revoke_share(&self, share: &mut Vertex) -> Result<()> {
        let (id, feed) = share.address()?;
        let object = share
            .content_mut()
            .and_then(|content| content.as_share_mut())
            .ok_or(GraphError::NotACapability { feed, id })?;
        object.revoked = true;
        self.put(share).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries and views
    // ─────────────────────────────────────────────────────────────────────────

    /// Start a query at an in-memory vertex.
    ///
    /// When the vertex is persisted, the keys on its edges are registered
    /// before the first step, as if it had just been read.
    pub fn query_at_vertex(&self, vertex: &Vertex) -> Query<'_, S> {
        Query::at_vertex(self, vertex.clone())
    }

    /// Start a query at a stored vertex; `feed` defaults to the default feed.
    pub fn query_from(&self, id: u64, feed: Option<FeedId>) -> Query<'_, S> {
        Query::from_address(self, id, feed.unwrap_or_else(|| self.default_feed()))
    }

    /// Add (or replace) a named view.
    pub fn register_view(&self, view: Arc<dyn View>) {
        self.views.register(view);
    }

    pub fn views(&self) -> &ViewRegistry {
        &self.views
    }
}

#[async_trait]
impl<S: BlockStore> ViewContext for CapabilityGraph<S> {
    async fn load(&self, feed: FeedId, id: u64, version: Option<u64>) -> Result<Vertex> {
        Ok(self.core.get_vertex(id, feed, version).await?)
    }

    fn view(&self, name: &str) -> Result<Arc<dyn View>> {
        self.views.get(name)
    }

    fn default_feed(&self) -> FeedId {
        self.core.default_feed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sealgraph_core::SimpleObject;
    use sealgraph_store::MemoryStore;

    use crate::error::ErrorKind;

    fn graph() -> CapabilityGraph<MemoryStore> {
        CapabilityGraph::new(
            Keypair::from_seed(&[0x01; 32]),
            MemoryStore::new(),
            GraphConfig::default(),
        )
    }

    #[test]
    fn test_default_feed_is_derived_from_author() {
        let g = graph();
        assert_eq!(g.default_feed(), g.feed("default"));
        assert_ne!(g.default_feed(), g.feed("other"));
    }

    #[tokio::test]
    async fn test_get_key_requires_persisted_vertex() {
        let g = graph();
        let err = g.get_key(&g.create()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotPersisted);
    }

    #[tokio::test]
    async fn test_get_key_after_eviction() {
        let g = graph();
        let mut v = Vertex::with_content(SimpleObject::new().set("a", "b"));
        g.put(&mut v).await.unwrap();
        assert!(g.get_key(&v).is_ok());

        g.evict_vertex_key(v.id().unwrap(), g.default_feed());
        assert_eq!(g.get_key(&v).unwrap_err().kind(), ErrorKind::KeyNotFound);
    }

    #[tokio::test]
    async fn test_revoke_non_share_fails() {
        let g = graph();
        let mut v = Vertex::with_content(SimpleObject::new());
        g.put(&mut v).await.unwrap();
        assert_eq!(
            g.revoke_share(&mut v).await.unwrap_err().kind(),
            ErrorKind::NotACapability
        );
    }

    #[tokio::test]
    async fn test_get_missing_vertex() {
        let g = graph();
        assert_eq!(
            g.get(5, None, None).await.unwrap_err().kind(),
            ErrorKind::VertexNotFound
        );
    }
}
