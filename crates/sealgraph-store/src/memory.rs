//! In-memory implementation of the BlockStore trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use sealgraph_core::FeedId;

use crate::error::{Result, StoreError};
use crate::traits::{check_object_ids, Block, BlockStore, FeedHead, StoredBlock};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
#[derive(Default)]
pub struct MemoryStore {
    feeds: RwLock<HashMap<FeedId, MemoryFeed>>,
}

#[derive(Default)]
struct MemoryFeed {
    /// Blocks in append order; the index is the position.
    blocks: Vec<(u64, Bytes)>,
    objects: u64,
}

impl MemoryFeed {
    fn head(&self) -> FeedHead {
        FeedHead {
            length: self.blocks.len() as u64,
            objects: self.objects,
        }
    }

    fn stored(&self, position: u64) -> Option<StoredBlock> {
        let index = usize::try_from(position).ok()?;
        self.blocks.get(index).map(|(object_id, data)| StoredBlock {
            position,
            object_id: *object_id,
            data: data.clone(),
        })
    }
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rewrite the bytes of a stored block in place.
    ///
    /// The log is append-only for every other caller; this exists to simulate
    /// on-disk corruption in tests. Returns `false` if there is no such block.
    pub fn tamper<F>(&self, feed: &FeedId, position: u64, f: F) -> bool
    where
        F: FnOnce(&mut Vec<u8>),
    {
        let mut feeds = self.feeds.write().unwrap_or_else(PoisonError::into_inner);
        let Some(slot) = feeds
            .get_mut(feed)
            .and_then(|entry| entry.blocks.get_mut(usize::try_from(position).ok()?))
        else {
            return false;
        };
        let mut bytes = slot.1.to_vec();
        f(&mut bytes);
        slot.1 = Bytes::from(bytes);
        true
    }
}

#[async_trait]
impl BlockStore for MemoryStore {
    async fn head(&self, feed: &FeedId) -> Result<FeedHead> {
        let feeds = self.feeds.read().unwrap_or_else(PoisonError::into_inner);
        Ok(feeds.get(feed).map(MemoryFeed::head).unwrap_or_default())
    }

    async fn append_blocks(
        &self,
        feed: &FeedId,
        expected_length: u64,
        blocks: Vec<Block>,
    ) -> Result<FeedHead> {
        let mut feeds = self.feeds.write().unwrap_or_else(PoisonError::into_inner);
        let entry = feeds.entry(*feed).or_default();

        let actual = entry.blocks.len() as u64;
        if actual != expected_length {
            return Err(StoreError::Conflict {
                feed: *feed,
                expected: expected_length,
                actual,
            });
        }

        let objects = check_object_ids(entry.objects, &blocks)?;
        let count = blocks.len();
        entry
            .blocks
            .extend(blocks.into_iter().map(|b| (b.object_id, b.data)));
        entry.objects = objects;

        debug!(%feed, count, length = entry.blocks.len(), "appended blocks");
        Ok(entry.head())
    }

    async fn get_block(&self, feed: &FeedId, position: u64) -> Result<Option<StoredBlock>> {
        let feeds = self.feeds.read().unwrap_or_else(PoisonError::into_inner);
        Ok(feeds.get(feed).and_then(|f| f.stored(position)))
    }

    async fn latest_block(
        &self,
        feed: &FeedId,
        object_id: u64,
        version: u64,
    ) -> Result<Option<StoredBlock>> {
        let feeds = self.feeds.read().unwrap_or_else(PoisonError::into_inner);
        let Some(f) = feeds.get(feed) else {
            return Ok(None);
        };

        let end = usize::try_from(version)
            .unwrap_or(usize::MAX)
            .min(f.blocks.len());
        let found = f.blocks[..end]
            .iter()
            .rposition(|(id, _)| *id == object_id);
        Ok(found.and_then(|index| f.stored(index as u64)))
    }

    async fn list_feeds(&self) -> Result<Vec<FeedId>> {
        let feeds = self.feeds.read().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<FeedId> = feeds
            .iter()
            .filter(|(_, f)| !f.blocks.is_empty())
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        Ok(ids)
    }
}
