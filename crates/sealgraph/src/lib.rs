//! # SealGraph
//!
//! An encrypted, capability-based graph over append-only feeds.
//!
//! ## Overview
//!
//! Every vertex is sealed under its own symmetric key. Holding that key is
//! read access; there are no principals and no access lists. When a vertex is
//! written, the keys of the vertices it points to are embedded in its edges,
//! so reading a vertex hands out the keys of its children.
//!
//! ## Key Concepts
//!
//! - **Feed**: an append-only log of sealed records owned by one author
//! - **Vertex**: content plus ordered, labelled edges; rewritten by appending
//! - **Share**: a vertex that grants access to another vertex through its
//!   single `share` edge, and can be revoked without re-keying the target
//! - **View**: a named strategy for resolving edges during queries
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sealgraph::{CapabilityGraph, GraphConfig, ShareOptions, SHARE_VIEW};
//! use sealgraph::core::{EdgeOptions, Keypair, SimpleObject, Vertex};
//! use sealgraph::store::SqliteStore;
//!
//! async fn example() -> sealgraph::Result<()> {
//!     let store = SqliteStore::open("graph.db")?;
//!     let graph = CapabilityGraph::new(Keypair::generate(), store, GraphConfig::default());
//!
//!     let mut doc = Vertex::with_content(SimpleObject::new().set("title", "notes"));
//!     graph.put(&mut doc).await?;
//!
//!     // Grant access to `doc` through a share, and link to it
//!     let share = graph.create_share(&doc, ShareOptions::default()).await?;
//!     let mut home = graph.create();
//!     home.add_edge_to_with(&share, "shared", EdgeOptions::view(SHARE_VIEW))?;
//!     graph.put(&mut home).await?;
//!
//!     let reached = graph.query_at_vertex(&home).out("shared").vertices().await?;
//!     assert!(reached[0].same_object(&doc));
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `sealgraph::core` - Ids, keys, records, vertices
//! - `sealgraph::store` - Block storage and SQLite
//! - `sealgraph::crypto` - Encrypted transactions

pub mod config;
pub mod error;
pub mod graph;
pub mod query;
pub mod share;
pub mod view;

// Re-export component crates
pub use sealgraph_core as core;
pub use sealgraph_crypto as crypto;
pub use sealgraph_store as store;

pub use config::GraphConfig;
pub use error::{ErrorKind, GraphError, Result};
pub use graph::CapabilityGraph;
pub use query::{PathStep, Query, QueryState};
pub use share::{ShareOptions, ShareView};
pub use view::{GraphView, View, ViewContext, ViewRegistry, GRAPH_VIEW};

pub use sealgraph_core::{
    CipherKind, Content, Edge, EdgeOptions, FeedId, KeyStore, Keypair, ShareObject, SimpleObject,
    SymmetricKey, Vertex, SHARE_LABEL, SHARE_VIEW,
};
