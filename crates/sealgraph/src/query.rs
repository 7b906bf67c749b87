//! Query engine.
//!
//! A query starts at one vertex and applies steps in order. Each step follows
//! every matching outgoing edge of every current state, resolving it through
//! the view the edge names. Any failure aborts the whole query.

use tracing::debug;

use sealgraph_core::{FeedId, Vertex};
use sealgraph_store::BlockStore;

use crate::error::Result;
use crate::graph::CapabilityGraph;
use crate::view::{ViewContext, GRAPH_VIEW};

/// One hop of a query path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathStep {
    pub label: String,
    pub feed: FeedId,
    pub target: u64,
}

/// A vertex reached by a query, with how it was reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryState {
    pub vertex: Vertex,
    pub path: Vec<PathStep>,
    /// Name of the view that produced this state.
    pub view: String,
}

impl QueryState {
    pub fn new(vertex: Vertex) -> Self {
        Self {
            vertex,
            path: Vec::new(),
            view: GRAPH_VIEW.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
enum Step {
    Out(String),
    OutAny,
}

impl Step {
    fn matches(&self, label: &str) -> bool {
        match self {
            Step::Out(wanted) => wanted == label,
            Step::OutAny => true,
        }
    }
}

#[derive(Debug, Clone)]
enum Start {
    Vertex(Vertex),
    Address { id: u64, feed: FeedId },
}

/// A lazily executed traversal.
pub struct Query<'g, S: BlockStore> {
    graph: &'g CapabilityGraph<S>,
    start: Start,
    steps: Vec<Step>,
}

impl<'g, S: BlockStore> Query<'g, S> {
    pub(crate) fn at_vertex(graph: &'g CapabilityGraph<S>, vertex: Vertex) -> Self {
        Self {
            graph,
            start: Start::Vertex(vertex),
            steps: Vec::new(),
        }
    }

    pub(crate) fn from_address(graph: &'g CapabilityGraph<S>, id: u64, feed: FeedId) -> Self {
        Self {
            graph,
            start: Start::Address { id, feed },
            steps: Vec::new(),
        }
    }

    /// Follow outgoing edges labelled `label`.
    pub fn out(mut self, label: impl Into<String>) -> Self {
        self.steps.push(Step::Out(label.into()));
        self
    }

    /// Follow every outgoing edge.
    pub fn out_any(mut self) -> Self {
        self.steps.push(Step::OutAny);
        self
    }

    /// Run the query and return every final state.
    pub async fn states(self) -> Result<Vec<QueryState>> {
        let start = match self.start {
            Start::Vertex(vertex) => {
                // Same key registration a read would have done.
                if vertex.is_persisted() {
                    self.graph.core().register_edges(&vertex);
                }
                vertex
            }
            Start::Address { id, feed } => self.graph.load(feed, id, None).await?,
        };

        let mut states = vec![QueryState::new(start)];
        for step in &self.steps {
            let mut next = Vec::new();
            for state in &states {
                for edge in state.vertex.edges().iter().filter(|e| step.matches(&e.label)) {
                    let view = self.graph.view(edge.view.as_deref().unwrap_or(GRAPH_VIEW))?;
                    debug!(label = %edge.label, target = edge.target, view = view.name(), "resolving edge");
                    next.extend(view.resolve(self.graph, edge, state).await?);
                }
            }
            states = next;
        }
        Ok(states)
    }

    /// Run the query and return the vertices reached.
    pub async fn vertices(self) -> Result<Vec<Vertex>> {
        Ok(self
            .states()
            .await?
            .into_iter()
            .map(|state| state.vertex)
            .collect())
    }

    /// Run the query and return the first vertex reached, if any.
    pub async fn first(self) -> Result<Option<Vertex>> {
        Ok(self.vertices().await?.into_iter().next())
    }
}
