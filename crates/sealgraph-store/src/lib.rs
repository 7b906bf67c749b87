//! # SealGraph Store
//!
//! Storage abstraction for SealGraph: append-only feeds of opaque blocks,
//! with SQLite and in-memory implementations.
//!
//! ## Key Types
//!
//! - [`BlockStore`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`FeedHead`] - Length and object count of a feed
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sealgraph_store::{Block, BlockStore, SqliteStore};
//! use sealgraph_core::FeedId;
//!
//! async fn example() {
//!     let store = SqliteStore::open("graph.db").unwrap();
//!     let feed = FeedId::from_bytes([0; 32]);
//!
//!     let head = store.head(&feed).await.unwrap();
//!     store
//!         .append_blocks(&feed, head.length, vec![Block::new(head.objects, vec![1u8, 2, 3])])
//!         .await
//!         .unwrap();
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Optimistic appends**: a writer states the length it expects; if the
//!   feed moved, the append fails with `Conflict` and nothing is written
//! - **Object ids**: a block either rewrites an existing object or creates
//!   the next one, so ids are dense and allocated in append order
//! - **Pinned reads**: `latest_block` takes a version (feed length) and only
//!   sees blocks before it

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{Block, BlockStore, FeedHead, StoredBlock};
