//! Views: named strategies for resolving an edge into query states.
//!
//! Every edge may name the view that resolves it. [`GraphView`] follows the
//! edge to its target; other views (such as
//! [`ShareView`](crate::share::ShareView)) can redirect, expand or refuse.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use tracing::debug;

use sealgraph_core::{Edge, FeedId, Vertex};

use crate::error::{GraphError, Result};
use crate::query::{PathStep, QueryState};

/// Name of the default view.
pub const GRAPH_VIEW: &str = "GraphView";

/// What a view may ask of the graph while resolving an edge.
#[async_trait]
pub trait ViewContext: Send + Sync {
    /// Load a vertex, registering the keys on its edges.
    async fn load(&self, feed: FeedId, id: u64, version: Option<u64>) -> Result<Vertex>;

    /// Look up a registered view.
    fn view(&self, name: &str) -> Result<Arc<dyn View>>;

    /// Feed used when neither the edge nor the source vertex names one.
    fn default_feed(&self) -> FeedId;
}

/// A strategy for resolving one edge from one query state.
#[async_trait]
pub trait View: Send + Sync {
    fn name(&self) -> &str;

    /// Resolve `edge`, an outgoing edge of `state.vertex`.
    async fn resolve(
        &self,
        ctx: &dyn ViewContext,
        edge: &Edge,
        state: &QueryState,
    ) -> Result<Vec<QueryState>>;
}

/// Feed an edge points into, given the vertex it leaves from.
pub fn edge_feed(ctx: &dyn ViewContext, edge: &Edge, source: &Vertex) -> FeedId {
    edge.target_feed(source.feed())
        .unwrap_or_else(|| ctx.default_feed())
}

/// Direct dereference of the edge target.
#[derive(Debug, Default, Clone, Copy)]
pub struct GraphView;

#[async_trait]
impl View for GraphView {
    fn name(&self) -> &str {
        GRAPH_VIEW
    }

    async fn resolve(
        &self,
        ctx: &dyn ViewContext,
        edge: &Edge,
        state: &QueryState,
    ) -> Result<Vec<QueryState>> {
        let feed = edge_feed(ctx, edge, &state.vertex);
        let vertex = ctx.load(feed, edge.target, edge.version).await?;
        Ok(vec![state.step(edge, feed, vertex, GRAPH_VIEW)])
    }
}

/// Views by name.
pub struct ViewRegistry {
    views: RwLock<HashMap<String, Arc<dyn View>>>,
}

impl ViewRegistry {
    /// An empty registry.
    pub fn empty() -> Self {
        Self {
            views: RwLock::new(HashMap::new()),
        }
    }

    /// Register (or replace) a view under its own name.
    pub fn register(&self, view: Arc<dyn View>) {
        let name = view.name().to_string();
        debug!(view = %name, "registered view");
        self.views
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, view);
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn View>> {
        self.views
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| GraphError::UnknownView(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.views
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Registered view names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .views
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

impl Default for ViewRegistry {
    /// A registry holding [`GraphView`] and [`ShareView`](crate::share::ShareView).
    fn default() -> Self {
        let registry = Self::empty();
        registry.register(Arc::new(GraphView));
        registry.register(Arc::new(crate::share::ShareView));
        registry
    }
}

impl QueryState {
    /// The state reached from `self` by following `edge` to `vertex`.
    pub(crate) fn step(&self, edge: &Edge, feed: FeedId, vertex: Vertex, view: &str) -> QueryState {
        let mut path = self.path.clone();
        path.push(PathStep {
            label: edge.label.clone(),
            feed,
            target: edge.target,
        });
        QueryState {
            vertex,
            path,
            view: view.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sealgraph_core::SHARE_VIEW;

    #[test]
    fn test_default_registry_has_builtin_views() {
        let registry = ViewRegistry::default();
        assert_eq!(registry.names(), vec![GRAPH_VIEW.to_string(), SHARE_VIEW.to_string()]);
        assert!(registry.get(GRAPH_VIEW).is_ok());
    }

    #[test]
    fn test_unknown_view() {
        let registry = ViewRegistry::empty();
        assert!(matches!(
            registry.get("Nope"),
            Err(GraphError::UnknownView(name)) if name == "Nope"
        ));
    }
}
