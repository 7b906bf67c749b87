//! BlockStore trait: the abstract interface for feed persistence.
//!
//! A feed is an append-only sequence of blocks. Each block belongs to one
//! object; an object's first block creates it and later blocks supersede it.
//! The store knows nothing about encryption; it only orders opaque bytes.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use sealgraph_core::FeedId;

use crate::error::Result;

/// A block to append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Object this block writes. Must be an existing object or the next new one.
    pub object_id: u64,
    pub data: Bytes,
}

impl Block {
    pub fn new(object_id: u64, data: impl Into<Bytes>) -> Self {
        Self {
            object_id,
            data: data.into(),
        }
    }
}

/// A block as stored, with its position in the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlock {
    pub position: u64,
    pub object_id: u64,
    pub data: Bytes,
}

/// Summary of a feed's current state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedHead {
    /// Number of blocks in the feed. Also the position of the next block.
    pub length: u64,
    /// Number of distinct objects. Also the id of the next new object.
    pub objects: u64,
}

/// The BlockStore trait: async interface for append-only feeds.
///
/// All methods are async so SQLite can run on the blocking pool via
/// `spawn_blocking`.
#[async_trait]
pub trait BlockStore: Send + Sync {
    /// Current head of a feed. Unknown feeds are empty.
    async fn head(&self, feed: &FeedId) -> Result<FeedHead>;

    /// Append `blocks` atomically, provided the feed is still `expected_length`
    /// long. Returns the new head.
    ///
    /// Fails with [`StoreError::Conflict`](crate::StoreError::Conflict) if
    /// another writer advanced the feed, and with `InvalidData` if a block
    /// skips an object id.
    async fn append_blocks(
        &self,
        feed: &FeedId,
        expected_length: u64,
        blocks: Vec<Block>,
    ) -> Result<FeedHead>;

    /// Block at an exact position.
    async fn get_block(&self, feed: &FeedId, position: u64) -> Result<Option<StoredBlock>>;

    /// Latest block for `object_id` at a position below `version`.
    async fn latest_block(
        &self,
        feed: &FeedId,
        object_id: u64,
        version: u64,
    ) -> Result<Option<StoredBlock>>;

    /// All feeds holding at least one block.
    async fn list_feeds(&self) -> Result<Vec<FeedId>>;
}

#[async_trait]
impl<S: BlockStore + ?Sized> BlockStore for Arc<S> {
    async fn head(&self, feed: &FeedId) -> Result<FeedHead> {
        (**self).head(feed).await
    }

    async fn append_blocks(
        &self,
        feed: &FeedId,
        expected_length: u64,
        blocks: Vec<Block>,
    ) -> Result<FeedHead> {
        (**self).append_blocks(feed, expected_length, blocks).await
    }

    async fn get_block(&self, feed: &FeedId, position: u64) -> Result<Option<StoredBlock>> {
        (**self).get_block(feed, position).await
    }

    async fn latest_block(
        &self,
        feed: &FeedId,
        object_id: u64,
        version: u64,
    ) -> Result<Option<StoredBlock>> {
        (**self).latest_block(feed, object_id, version).await
    }

    async fn list_feeds(&self) -> Result<Vec<FeedId>> {
        (**self).list_feeds().await
    }
}

/// Check that `blocks` only write existing objects or allocate the next ids
/// in order. Returns the object count after the append.
pub(crate) fn check_object_ids(objects: u64, blocks: &[Block]) -> Result<u64> {
    let mut next = objects;
    for block in blocks {
        if block.object_id > next {
            return Err(crate::StoreError::InvalidData(format!(
                "object id {} skips ahead of next id {}",
                block.object_id, next
            )));
        }
        if block.object_id == next {
            next += 1;
        }
    }
    Ok(next)
}
