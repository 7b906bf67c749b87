//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;

use sealgraph::{CapabilityGraph, GraphConfig};
use sealgraph_core::{Content, Ed25519PublicKey, FeedId, KeyStore, Keypair, SimpleObject, Vertex};
use sealgraph_store::MemoryStore;

/// Content field used by [`text_vertex`] and [`text_of`].
pub const TEXT_FIELD: &str = "text";

/// A test fixture: one author, one in-memory store, one graph.
pub struct TestFixture {
    pub keypair: Keypair,
    pub store: Arc<MemoryStore>,
    pub graph: CapabilityGraph<MemoryStore>,
}

impl TestFixture {
    /// Create a new test fixture with a random keypair.
    pub fn new() -> Self {
        Self::with_keypair(Keypair::generate(), GraphConfig::default())
    }

    /// Create with a deterministic keypair from seed.
    pub fn with_seed(seed: [u8; 32]) -> Self {
        Self::with_keypair(Keypair::from_seed(&seed), GraphConfig::default())
    }

    /// Create with a deterministic keypair and a custom configuration.
    pub fn with_config(seed: [u8; 32], config: GraphConfig) -> Self {
        Self::with_keypair(Keypair::from_seed(&seed), config)
    }

    fn with_keypair(keypair: Keypair, config: GraphConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let graph = CapabilityGraph::with_keys(
            keypair.clone(),
            store.clone(),
            Arc::new(KeyStore::new()),
            config,
        );
        Self {
            keypair,
            store,
            graph,
        }
    }

    pub fn public_key(&self) -> Ed25519PublicKey {
        self.keypair.public_key()
    }

    pub fn default_feed(&self) -> FeedId {
        self.graph.default_feed()
    }

    /// A second graph over the same store with an empty key store.
    ///
    /// It sees every block but can read only what it is given keys for.
    pub fn reader(&self) -> CapabilityGraph<MemoryStore> {
        CapabilityGraph::with_keys(
            self.keypair.clone(),
            self.store.clone(),
            Arc::new(KeyStore::new()),
            self.graph.config().clone(),
        )
    }

    /// Persist a vertex holding `text`.
    pub async fn put_text(&self, text: &str) -> sealgraph::Result<Vertex> {
        let mut vertex = text_vertex(text);
        self.graph.put(&mut vertex).await?;
        Ok(vertex)
    }

    /// Persist a linked list of text vertices.
    ///
    /// Vertices are written tail first so each one can embed the key of the
    /// next. Returned in list order: the head comes first.
    pub async fn put_chain(&self, texts: &[&str], label: &str) -> sealgraph::Result<Vec<Vertex>> {
        let mut chain: Vec<Vertex> = Vec::with_capacity(texts.len());
        for text in texts.iter().rev() {
            let mut vertex = text_vertex(text);
            if let Some(next) = chain.last() {
                vertex.add_edge_to(next, label)?;
            }
            self.graph.put(&mut vertex).await?;
            chain.push(vertex);
        }
        chain.reverse();
        Ok(chain)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Create multiple test fixtures for multi-party tests.
pub fn multi_party_fixtures(count: usize) -> Vec<TestFixture> {
    (0..count)
        .map(|i| {
            let mut seed = [0u8; 32];
            seed[0] = i as u8;
            TestFixture::with_seed(seed)
        })
        .collect()
}

/// An unpersisted vertex holding `text`.
pub fn text_vertex(text: &str) -> Vertex {
    Vertex::with_content(SimpleObject::new().set(TEXT_FIELD, text))
}

/// The text of a vertex made by [`text_vertex`].
pub fn text_of(vertex: &Vertex) -> Option<&str> {
    vertex
        .content()
        .and_then(Content::as_simple)
        .and_then(|obj| obj.get(TEXT_FIELD))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sealgraph::ErrorKind;

    #[tokio::test]
    async fn test_put_text_reads_back() {
        let fixture = TestFixture::new();
        let v = fixture.put_text("hello").await.unwrap();

        let read = fixture.graph.get(v.id().unwrap(), None, None).await.unwrap();
        assert_eq!(text_of(&read), Some("hello"));
    }

    #[tokio::test]
    async fn test_chain_links_in_order() {
        let fixture = TestFixture::new();
        let chain = fixture.put_chain(&["a", "b", "c"], "next").await.unwrap();

        assert_eq!(chain.len(), 3);
        assert_eq!(text_of(&chain[0]), Some("a"));
        assert_eq!(chain[0].edges()[0].target, chain[1].id().unwrap());
        assert!(chain[2].edges().is_empty());
    }

    #[tokio::test]
    async fn test_reader_starts_without_keys() {
        let fixture = TestFixture::with_seed([0x05; 32]);
        let v = fixture.put_text("secret").await.unwrap();

        let reader = fixture.reader();
        assert_eq!(reader.default_feed(), fixture.default_feed());
        let err = reader.get(v.id().unwrap(), None, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AccessDenied);
    }

    #[test]
    fn test_multi_party() {
        let parties = multi_party_fixtures(3);

        let feeds: Vec<_> = parties.iter().map(|p| p.default_feed()).collect();
        assert_ne!(feeds[0], feeds[1]);
        assert_ne!(feeds[1], feeds[2]);
        assert_ne!(feeds[0], feeds[2]);
    }
}
