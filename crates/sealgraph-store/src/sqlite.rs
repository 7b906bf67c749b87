//! SQLite implementation of the BlockStore trait.
//!
//! The persistent backend. It uses rusqlite with bundled SQLite, wrapped in
//! async via `tokio::task::spawn_blocking`.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use bytes::Bytes;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use sealgraph_core::FeedId;

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{check_object_ids, Block, BlockStore, FeedHead, StoredBlock};

/// SQLite-based store implementation.
///
/// Thread-safe via an internal Mutex. All operations use `spawn_blocking`
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path, creating and migrating it
    /// as needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().unwrap_or_else(PoisonError::into_inner);
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

fn read_head(conn: &Connection, feed: &FeedId) -> Result<FeedHead> {
    let head = conn
        .query_row(
            "SELECT length, objects FROM feeds WHERE feed_id = ?1",
            params![feed.as_bytes().as_slice()],
            |row| {
                Ok(FeedHead {
                    length: row.get(0)?,
                    objects: row.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(head.unwrap_or_default())
}

fn row_to_block(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredBlock> {
    let data: Vec<u8> = row.get("data")?;
    Ok(StoredBlock {
        position: row.get("position")?,
        object_id: row.get("object_id")?,
        data: Bytes::from(data),
    })
}

fn feed_from_blob(bytes: Vec<u8>) -> Result<FeedId> {
    FeedId::try_from(bytes.as_slice())
        .map_err(|_| StoreError::InvalidData(format!("feed id of {} bytes", bytes.len())))
}

#[async_trait]
impl BlockStore for SqliteStore {
    async fn head(&self, feed: &FeedId) -> Result<FeedHead> {
        let feed = *feed;
        self.with_conn(move |conn| read_head(conn, &feed)).await
    }

    async fn append_blocks(
        &self,
        feed: &FeedId,
        expected_length: u64,
        blocks: Vec<Block>,
    ) -> Result<FeedHead> {
        let feed = *feed;
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;

            let head = read_head(&tx, &feed)?;
            if head.length != expected_length {
                return Err(StoreError::Conflict {
                    feed,
                    expected: expected_length,
                    actual: head.length,
                });
            }
            let objects = check_object_ids(head.objects, &blocks)?;

            {
                let mut insert = tx.prepare(
                    "INSERT INTO blocks (feed_id, position, object_id, data)
                     VALUES (?1, ?2, ?3, ?4)",
                )?;
                for (offset, block) in blocks.iter().enumerate() {
                    insert.execute(params![
                        feed.as_bytes().as_slice(),
                        head.length + offset as u64,
                        block.object_id,
                        block.data.as_ref(),
                    ])?;
                }
            }

            let new_head = FeedHead {
                length: head.length + blocks.len() as u64,
                objects,
            };
            tx.execute(
                "INSERT INTO feeds (feed_id, length, objects) VALUES (?1, ?2, ?3)
                 ON CONFLICT(feed_id) DO UPDATE SET length = ?2, objects = ?3",
                params![feed.as_bytes().as_slice(), new_head.length, new_head.objects],
            )?;
            tx.commit()?;

            debug!(%feed, count = blocks.len(), length = new_head.length, "appended blocks");
            Ok(new_head)
        })
        .await
    }

    async fn get_block(&self, feed: &FeedId, position: u64) -> Result<Option<StoredBlock>> {
        let feed = *feed;
        self.with_conn(move |conn| {
            let block = conn
                .query_row(
                    "SELECT position, object_id, data FROM blocks
                     WHERE feed_id = ?1 AND position = ?2",
                    params![feed.as_bytes().as_slice(), position],
                    row_to_block,
                )
                .optional()?;
            Ok(block)
        })
        .await
    }

    async fn latest_block(
        &self,
        feed: &FeedId,
        object_id: u64,
        version: u64,
    ) -> Result<Option<StoredBlock>> {
        let feed = *feed;
        // Positions are stored as SQLite integers.
        let version = version.min(i64::MAX as u64);
        self.with_conn(move |conn| {
            let block = conn
                .query_row(
                    "SELECT position, object_id, data FROM blocks
                     WHERE feed_id = ?1 AND object_id = ?2 AND position < ?3
                     ORDER BY position DESC LIMIT 1",
                    params![feed.as_bytes().as_slice(), object_id, version],
                    row_to_block,
                )
                .optional()?;
            Ok(block)
        })
        .await
    }

    async fn list_feeds(&self) -> Result<Vec<FeedId>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT feed_id FROM feeds WHERE length > 0 ORDER BY feed_id")?;
            let blobs = stmt
                .query_map([], |row| row.get::<_, Vec<u8>>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            blobs.into_iter().map(feed_from_blob).collect()
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(byte: u8) -> FeedId {
        FeedId::from_bytes([byte; 32])
    }

    #[tokio::test]
    async fn test_append_and_get() {
        let store = SqliteStore::open_memory().unwrap();
        let head = store
            .append_blocks(
                &feed(1),
                0,
                vec![Block::new(0, &b"first"[..]), Block::new(0, &b"second"[..])],
            )
            .await
            .unwrap();
        assert_eq!(head, FeedHead { length: 2, objects: 1 });

        let block = store.get_block(&feed(1), 1).await.unwrap().unwrap();
        assert_eq!(block.position, 1);
        assert_eq!(&block.data[..], b"second");
        assert!(store.get_block(&feed(1), 2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_conflict_leaves_feed_untouched() {
        let store = SqliteStore::open_memory().unwrap();
        store
            .append_blocks(&feed(1), 0, vec![Block::new(0, &b"a"[..])])
            .await
            .unwrap();

        let err = store
            .append_blocks(&feed(1), 0, vec![Block::new(1, &b"b"[..])])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { actual: 1, .. }));
        assert_eq!(
            store.head(&feed(1)).await.unwrap(),
            FeedHead { length: 1, objects: 1 }
        );
    }

    #[tokio::test]
    async fn test_skipped_object_id_rolls_back() {
        let store = SqliteStore::open_memory().unwrap();
        let err = store
            .append_blocks(
                &feed(1),
                0,
                vec![Block::new(0, &b"ok"[..]), Block::new(5, &b"bad"[..])],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidData(_)));
        assert_eq!(store.head(&feed(1)).await.unwrap(), FeedHead::default());
    }

    #[tokio::test]
    async fn test_latest_block_pinned() {
        let store = SqliteStore::open_memory().unwrap();
        store
            .append_blocks(
                &feed(2),
                0,
                vec![
                    Block::new(0, &b"v1"[..]),
                    Block::new(1, &b"x"[..]),
                    Block::new(0, &b"v2"[..]),
                ],
            )
            .await
            .unwrap();

        let latest = store
            .latest_block(&feed(2), 0, u64::MAX)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&latest.data[..], b"v2");

        let pinned = store.latest_block(&feed(2), 0, 1).await.unwrap().unwrap();
        assert_eq!(&pinned.data[..], b"v1");
        assert!(store.latest_block(&feed(2), 1, 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store
                .append_blocks(&feed(3), 0, vec![Block::new(0, &b"kept"[..])])
                .await
                .unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.head(&feed(3)).await.unwrap().length, 1);
        assert_eq!(store.list_feeds().await.unwrap(), vec![feed(3)]);
        let block = store.get_block(&feed(3), 0).await.unwrap().unwrap();
        assert_eq!(&block.data[..], b"kept");
    }
}
