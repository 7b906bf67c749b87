//! Vertices and edges.
//!
//! A vertex is created in memory without an id, gets its id, feed and
//! version when it is first persisted, and is changed afterwards only by
//! editing a fetched copy and writing it again.

use crate::content::Content;
use crate::crypto::SymmetricKey;
use crate::error::{CoreError, Result};
use crate::types::FeedId;

/// Structured edge metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeMetadata {
    /// Key of the target vertex, readable by whoever can read the source.
    pub key: Option<SymmetricKey>,
    /// When set, the target's key is never embedded automatically.
    pub envelope: bool,
}

/// A directed, labelled link to another vertex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    /// Non-unique label.
    pub label: String,
    /// Object index of the target within its feed.
    pub target: u64,
    /// Feed of the target; the source vertex's feed when absent.
    pub feed: Option<FeedId>,
    /// Version pin (feed length) to read the target at.
    pub version: Option<u64>,
    /// Name of the view strategy used to resolve this edge.
    pub view: Option<String>,
    pub metadata: EdgeMetadata,
}

impl Edge {
    pub fn new(label: impl Into<String>, target: u64) -> Self {
        Self {
            label: label.into(),
            target,
            feed: None,
            version: None,
            view: None,
            metadata: EdgeMetadata::default(),
        }
    }

    pub fn with_feed(mut self, feed: FeedId) -> Self {
        self.feed = Some(feed);
        self
    }

    pub fn with_version(mut self, version: u64) -> Self {
        self.version = Some(version);
        self
    }

    pub fn with_view(mut self, view: impl Into<String>) -> Self {
        self.view = Some(view.into());
        self
    }

    pub fn with_key(mut self, key: SymmetricKey) -> Self {
        self.metadata.key = Some(key);
        self
    }

    /// Suppress automatic key embedding for this edge.
    pub fn enveloped(mut self) -> Self {
        self.metadata.envelope = true;
        self
    }

    /// Feed of the target, falling back to the source vertex's feed.
    pub fn target_feed(&self, source: Option<FeedId>) -> Option<FeedId> {
        self.feed.or(source)
    }
}

/// Overrides for [`Vertex::add_edge_to_with`].
#[derive(Debug, Clone, Default)]
pub struct EdgeOptions {
    pub version: Option<u64>,
    pub feed: Option<FeedId>,
    pub view: Option<String>,
    pub envelope: bool,
}

impl EdgeOptions {
    pub fn view(name: impl Into<String>) -> Self {
        Self {
            view: Some(name.into()),
            ..Default::default()
        }
    }
}

/// A graph node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vertex {
    id: Option<u64>,
    feed: Option<FeedId>,
    version: Option<u64>,
    content: Option<Content>,
    edges: Vec<Edge>,
}

impl Vertex {
    /// A fresh, unpersisted vertex.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content(content: impl Into<Content>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    /// Object index within the feed; `None` until persisted.
    pub fn id(&self) -> Option<u64> {
        self.id
    }

    pub fn feed(&self) -> Option<FeedId> {
        self.feed
    }

    /// Feed length at which this vertex was read or written.
    pub fn version(&self) -> Option<u64> {
        self.version
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some() && self.feed.is_some()
    }

    /// `(id, feed)` of a persisted vertex.
    pub fn address(&self) -> Result<(u64, FeedId)> {
        match (self.id, self.feed) {
            (Some(id), Some(feed)) => Ok((id, feed)),
            _ => Err(CoreError::NotPersisted),
        }
    }

    /// Record where this vertex lives after a read or a committed write.
    pub fn mark_persisted(&mut self, id: u64, feed: FeedId, version: u64) {
        self.id = Some(id);
        self.feed = Some(feed);
        self.version = Some(version);
    }

    pub fn content(&self) -> Option<&Content> {
        self.content.as_ref()
    }

    pub fn content_mut(&mut self) -> Option<&mut Content> {
        self.content.as_mut()
    }

    pub fn set_content(&mut self, content: impl Into<Content>) {
        self.content = Some(content.into());
    }

    pub fn clear_content(&mut self) {
        self.content = None;
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edges_mut(&mut self) -> &mut [Edge] {
        &mut self.edges
    }

    /// Edges carrying `label`.
    pub fn edges_labeled<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.label == label)
    }

    pub fn add_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    /// Link to a persisted vertex.
    pub fn add_edge_to(&mut self, target: &Vertex, label: impl Into<String>) -> Result<()> {
        self.add_edge_to_with(target, label, EdgeOptions::default())
    }

    /// Link to a persisted vertex with explicit overrides.
    ///
    /// The target's feed is always recorded on the edge, so the link stays
    /// valid if this vertex ends up in a different feed.
    pub fn add_edge_to_with(
        &mut self,
        target: &Vertex,
        label: impl Into<String>,
        options: EdgeOptions,
    ) -> Result<()> {
        let (id, feed) = target.address()?;
        let mut edge = Edge::new(label, id).with_feed(options.feed.unwrap_or(feed));
        edge.version = options.version;
        edge.view = options.view;
        edge.metadata.envelope = options.envelope;
        self.edges.push(edge);
        Ok(())
    }

    /// Remove every edge carrying `label`, returning how many were dropped.
    pub fn remove_edges(&mut self, label: &str) -> usize {
        let before = self.edges.len();
        self.edges.retain(|e| e.label != label);
        before - self.edges.len()
    }

    /// Whether `other` is the same persisted object (ignores version and content).
    pub fn same_object(&self, other: &Vertex) -> bool {
        self.is_persisted() && self.id == other.id && self.feed == other.feed
    }

    pub(crate) fn from_parts(content: Option<Content>, edges: Vec<Edge>) -> Self {
        Self {
            content,
            edges,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::SimpleObject;

    fn persisted(id: u64) -> Vertex {
        let mut v = Vertex::with_content(SimpleObject::new().set("n", id.to_string()));
        v.mark_persisted(id, FeedId::from_bytes([0x11; 32]), id + 1);
        v
    }

    #[test]
    fn test_new_vertex_is_unpersisted() {
        let v = Vertex::new();
        assert!(!v.is_persisted());
        assert!(matches!(v.address(), Err(CoreError::NotPersisted)));
    }

    #[test]
    fn test_add_edge_to_requires_persisted_target() {
        let mut a = Vertex::new();
        let b = Vertex::new();
        assert!(a.add_edge_to(&b, "next").is_err());
        assert!(a.edges().is_empty());
    }

    #[test]
    fn test_add_edge_to_records_target() {
        let mut a = Vertex::new();
        let b = persisted(3);
        a.add_edge_to_with(&b, "link", EdgeOptions::view("ShareView"))
            .unwrap();

        let edge = &a.edges()[0];
        assert_eq!(edge.label, "link");
        assert_eq!(edge.target, 3);
        assert_eq!(edge.feed, b.feed());
        assert_eq!(edge.view.as_deref(), Some("ShareView"));
        assert_eq!(edge.version, None);
        assert!(edge.metadata.key.is_none());
    }

    #[test]
    fn test_edges_labeled_and_remove() {
        let mut a = Vertex::new();
        a.add_edge(Edge::new("x", 1));
        a.add_edge(Edge::new("y", 2));
        a.add_edge(Edge::new("x", 3));

        let targets: Vec<u64> = a.edges_labeled("x").map(|e| e.target).collect();
        assert_eq!(targets, vec![1, 3]);
        assert_eq!(a.remove_edges("x"), 2);
        assert_eq!(a.edges().len(), 1);
    }

    #[test]
    fn test_same_object_ignores_version() {
        let a = persisted(1);
        let mut b = persisted(1);
        b.mark_persisted(1, FeedId::from_bytes([0x11; 32]), 99);
        assert!(a.same_object(&b));
        assert!(!a.same_object(&persisted(2)));
    }

    #[test]
    fn test_target_feed_fallback() {
        let source = FeedId::from_bytes([1; 32]);
        let other = FeedId::from_bytes([2; 32]);
        assert_eq!(Edge::new("a", 0).target_feed(Some(source)), Some(source));
        assert_eq!(
            Edge::new("a", 0).with_feed(other).target_feed(Some(source)),
            Some(other)
        );
    }
}
