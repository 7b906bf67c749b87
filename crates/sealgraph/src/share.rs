//! Share resolution.
//!
//! An edge resolved through [`ShareView`] points at a share vertex, but the
//! query never stops there: the share is checked and then replaced by the
//! vertices its `share` edges lead to. The caller sees the target as if the
//! share were not there.

use async_trait::async_trait;
use tracing::{debug, warn};

use sealgraph_core::{Edge, SHARE_LABEL, SHARE_VIEW};

use crate::error::{GraphError, Result};
use crate::query::QueryState;
use crate::view::{edge_feed, View, ViewContext, GRAPH_VIEW};

/// Options for [`CapabilityGraph::create_share`](crate::CapabilityGraph::create_share).
#[derive(Debug, Clone, Default)]
pub struct ShareOptions {
    /// Recorded on the share object; the pin that governs resolution is the
    /// target's version at creation.
    pub version: Option<u64>,
    pub info: Option<String>,
    pub owner: Option<String>,
    /// View used to resolve the share edge, [`GRAPH_VIEW`] when absent.
    pub view: Option<String>,
}

/// Resolves share vertices into their targets.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShareView;

#[async_trait]
impl View for ShareView {
    fn name(&self) -> &str {
        SHARE_VIEW
    }

    async fn resolve(
        &self,
        ctx: &dyn ViewContext,
        edge: &Edge,
        state: &QueryState,
    ) -> Result<Vec<QueryState>> {
        let feed = edge_feed(ctx, edge, &state.vertex);
        let id = edge.target;
        let share_vertex = ctx.load(feed, id, edge.version).await?;

        let share = share_vertex
            .content()
            .and_then(|content| content.as_share())
            .ok_or(GraphError::NotACapability { feed, id })?;
        if share.is_revoked() {
            warn!(%feed, id, "share is revoked");
            return Err(GraphError::RevokedCapability { feed, id });
        }

        let share_edges: Vec<&Edge> = share_vertex.edges_labeled(SHARE_LABEL).collect();
        if share_edges.is_empty() {
            return Err(GraphError::MalformedCapability {
                feed,
                id,
                reason: format!("no '{}' edge", SHARE_LABEL),
            });
        }

        let inner = QueryState {
            vertex: share_vertex.clone(),
            path: Vec::new(),
            view: SHARE_VIEW.to_string(),
        };
        let mut resolved = Vec::new();
        for share_edge in share_edges {
            let view = ctx.view(share_edge.view.as_deref().unwrap_or(GRAPH_VIEW))?;
            debug!(%feed, id, view = view.name(), "following share edge");

            for reached in view.resolve(ctx, share_edge, &inner).await? {
                // The share hop is invisible: the caller's path gains only
                // the edge it followed.
                resolved.push(state.step(edge, feed, reached.vertex, &reached.view));
            }
        }
        Ok(resolved)
    }
}
