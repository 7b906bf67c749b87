//! Encrypted transactions over a single feed.
//!
//! A transaction is anchored at a head: the feed length when it was opened,
//! or a caller-supplied historical length. Reads see exactly the blocks below
//! that head. Writes are buffered and appended in one go at commit; if the
//! feed moved in the meantime the commit fails and nothing is written.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, warn};

use sealgraph_core::record::{open_record, seal_record, CHECKSUM_LEN};
use sealgraph_core::{CipherKind, CoreError, FeedId, KeyStore, SymmetricKey};
use sealgraph_store::{Block, BlockStore, FeedHead, StoreError};

use crate::error::{CryptoError, Result};

/// Outcome of a successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReceipt {
    pub feed: FeedId,
    /// Feed length after the commit.
    pub length: u64,
    /// Objects created by the transaction with their fresh keys, in order.
    pub created: Vec<(u64, SymmetricKey)>,
}

/// One session of reads and buffered writes over a feed.
pub struct EncryptedTransaction<S: BlockStore> {
    store: Arc<S>,
    keys: Arc<KeyStore>,
    feed: FeedId,
    head: FeedHead,
    cipher: CipherKind,
    read_only: bool,
    pending: Vec<Block>,
    created: Vec<(u64, SymmetricKey)>,
}

impl<S: BlockStore> EncryptedTransaction<S> {
    /// Open a transaction on `feed`.
    ///
    /// With `version`, the transaction is pinned to that feed length. A pin
    /// below the current length is read-only.
    pub async fn open(
        store: Arc<S>,
        keys: Arc<KeyStore>,
        feed: FeedId,
        version: Option<u64>,
        cipher: CipherKind,
    ) -> Result<Self> {
        let current = store.head(&feed).await?;
        let (head, read_only) = match version {
            Some(v) if v > current.length => {
                return Err(CryptoError::VersionOutOfRange {
                    feed,
                    version: v,
                    length: current.length,
                })
            }
            Some(v) if v < current.length => (
                FeedHead {
                    length: v,
                    objects: current.objects,
                },
                true,
            ),
            _ => (current, false),
        };

        Ok(Self {
            store,
            keys,
            feed,
            head,
            cipher,
            read_only,
            pending: Vec::new(),
            created: Vec::new(),
        })
    }

    /// Open a transaction that rejects writes.
    pub async fn open_read_only(
        store: Arc<S>,
        keys: Arc<KeyStore>,
        feed: FeedId,
        version: Option<u64>,
    ) -> Result<Self> {
        let mut tx = Self::open(store, keys, feed, version, CipherKind::default()).await?;
        tx.read_only = true;
        Ok(tx)
    }

    pub fn feed(&self) -> FeedId {
        self.feed
    }

    /// The feed length this transaction is anchored at.
    pub fn version(&self) -> u64 {
        self.head.length
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Number of buffered blocks.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.read_only {
            return Err(CryptoError::ReadOnly(self.feed));
        }
        Ok(())
    }

    fn next_position(&self) -> u64 {
        self.head.length + self.pending.len() as u64
    }

    fn next_object(&self) -> u64 {
        self.head.objects + self.created.len() as u64
    }

    /// Seal `plaintext` under a fresh key as a new object.
    ///
    /// The key is returned but not registered; [`crate::CryptoCore`] does that
    /// once the commit succeeds.
    pub fn create(&mut self, plaintext: &[u8]) -> Result<(u64, SymmetricKey)> {
        self.ensure_writable()?;

        let id = self.next_object();
        let position = self.next_position();
        let key = SymmetricKey::generate(self.cipher);
        let sealed = seal_record(plaintext, Some(&key), position)?;

        self.pending.push(Block::new(id, sealed));
        self.created.push((id, key.clone()));
        Ok((id, key))
    }

    /// Seal a new version of object `id`.
    ///
    /// Uses the key created for `id` in this transaction, else the registered
    /// one. Without either the write is refused: the record may carry the keys
    /// of other objects and must not reach the log in the clear.
    pub fn set(&mut self, id: u64, plaintext: &[u8]) -> Result<Bytes> {
        self.ensure_writable()?;
        if id >= self.next_object() {
            return Err(CryptoError::NotFound {
                feed: self.feed,
                id,
            });
        }

        let key = self
            .created
            .iter()
            .find(|(created, _)| *created == id)
            .map(|(_, key)| key.clone())
            .or_else(|| self.keys.get(&self.feed, id))
            .ok_or_else(|| {
                warn!(feed = %self.feed, id, "refusing to rewrite object without its key");
                CryptoError::KeyNotFound {
                    feed: self.feed,
                    id,
                }
            })?;

        let position = self.next_position();
        let sealed = Bytes::from(seal_record(plaintext, Some(&key), position)?);
        self.pending.push(Block::new(id, sealed.clone()));
        Ok(sealed)
    }

    /// Read and verify the latest committed version of `id` at the head.
    ///
    /// Buffered writes are not visible.
    pub async fn get(&self, id: u64) -> Result<Vec<u8>> {
        let block = self
            .store
            .latest_block(&self.feed, id, self.head.length)
            .await?
            .ok_or(CryptoError::NotFound {
                feed: self.feed,
                id,
            })?;
        if block.object_id != id {
            return Err(StoreError::InvalidData(format!(
                "block at {} belongs to object {}, not {}",
                block.position, block.object_id, id
            ))
            .into());
        }

        if block.data.len() < CHECKSUM_LEN {
            return Err(CryptoError::Corrupted {
                feed: self.feed,
                id,
                cause: CoreError::TruncatedRecord {
                    len: block.data.len(),
                },
            });
        }

        let key = self.keys.get(&self.feed, id);
        open_record(&block.data, key.as_ref(), block.position).map_err(|cause| {
            if key.is_some() {
                CryptoError::AccessDenied {
                    feed: self.feed,
                    id,
                    cause,
                }
            } else {
                CryptoError::Corrupted {
                    feed: self.feed,
                    id,
                    cause,
                }
            }
        })
    }

    /// Append every buffered block atomically.
    ///
    /// An empty transaction commits nothing and cannot conflict.
    pub async fn commit(self) -> Result<CommitReceipt> {
        if self.pending.is_empty() {
            return Ok(CommitReceipt {
                feed: self.feed,
                length: self.head.length,
                created: Vec::new(),
            });
        }

        let count = self.pending.len();
        let head = self
            .store
            .append_blocks(&self.feed, self.head.length, self.pending)
            .await?;

        debug!(feed = %self.feed, count, length = head.length, "committed transaction");
        Ok(CommitReceipt {
            feed: self.feed,
            length: head.length,
            created: self.created,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sealgraph_store::MemoryStore;

    fn setup() -> (Arc<MemoryStore>, Arc<KeyStore>, FeedId) {
        (
            Arc::new(MemoryStore::new()),
            Arc::new(KeyStore::new()),
            FeedId::from_bytes([0x33; 32]),
        )
    }

    async fn open(
        store: &Arc<MemoryStore>,
        keys: &Arc<KeyStore>,
        feed: FeedId,
    ) -> EncryptedTransaction<MemoryStore> {
        EncryptedTransaction::open(store.clone(), keys.clone(), feed, None, CipherKind::ChaCha20)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let (store, keys, feed) = setup();
        let mut tx = open(&store, &keys, feed).await;

        let (a, _) = tx.create(b"a").unwrap();
        let (b, _) = tx.create(b"b").unwrap();
        assert_eq!((a, b), (0, 1));
        assert_eq!(tx.pending(), 2);

        let receipt = tx.commit().await.unwrap();
        assert_eq!(receipt.length, 2);
        assert_eq!(receipt.created.len(), 2);
        // Keys are not registered by the transaction itself.
        assert!(keys.is_empty());
    }

    #[tokio::test]
    async fn test_get_with_registered_key() {
        let (store, keys, feed) = setup();
        let mut tx = open(&store, &keys, feed).await;
        let (id, key) = tx.create(b"secret").unwrap();
        tx.commit().await.unwrap();

        keys.register(key, feed, id);
        let tx = open(&store, &keys, feed).await;
        assert_eq!(tx.get(id).await.unwrap(), b"secret");
    }

    #[tokio::test]
    async fn test_get_without_key_is_corruption() {
        let (store, keys, feed) = setup();
        let mut tx = open(&store, &keys, feed).await;
        let (id, _) = tx.create(b"secret").unwrap();
        tx.commit().await.unwrap();

        let tx = open(&store, &keys, feed).await;
        assert!(matches!(
            tx.get(id).await,
            Err(CryptoError::Corrupted { .. })
        ));
    }

    #[tokio::test]
    async fn test_get_with_wrong_key_is_access_denied() {
        let (store, keys, feed) = setup();
        let mut tx = open(&store, &keys, feed).await;
        let (id, _) = tx.create(b"secret").unwrap();
        tx.commit().await.unwrap();

        keys.register(SymmetricKey::generate(CipherKind::ChaCha20), feed, id);
        let tx = open(&store, &keys, feed).await;
        assert!(matches!(
            tx.get(id).await,
            Err(CryptoError::AccessDenied { .. })
        ));
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let (store, keys, feed) = setup();
        let tx = open(&store, &keys, feed).await;
        assert!(matches!(tx.get(0).await, Err(CryptoError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_set_reuses_key_created_in_same_transaction() {
        let (store, keys, feed) = setup();
        let mut tx = open(&store, &keys, feed).await;
        let (id, key) = tx.create(b"v1").unwrap();
        tx.set(id, b"v2").unwrap();
        tx.commit().await.unwrap();

        keys.register(key, feed, id);
        let tx = open(&store, &keys, feed).await;
        assert_eq!(tx.get(id).await.unwrap(), b"v2");
    }

    #[tokio::test]
    async fn test_set_without_key_is_refused() {
        let (store, keys, feed) = setup();
        let mut tx = open(&store, &keys, feed).await;
        let (id, _) = tx.create(b"v1").unwrap();
        tx.commit().await.unwrap();

        let mut tx = open(&store, &keys, feed).await;
        assert!(matches!(
            tx.set(id, b"public"),
            Err(CryptoError::KeyNotFound { id: 0, .. })
        ));
        assert_eq!(tx.pending(), 0);
        tx.commit().await.unwrap();

        assert_eq!(store.head(&feed).await.unwrap().length, 1);
    }

    #[tokio::test]
    async fn test_set_unknown_id_fails() {
        let (store, keys, feed) = setup();
        let mut tx = open(&store, &keys, feed).await;
        assert!(matches!(tx.set(4, b"x"), Err(CryptoError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_concurrent_writer_is_head_moved() {
        let (store, keys, feed) = setup();
        let mut first = open(&store, &keys, feed).await;
        let mut second = open(&store, &keys, feed).await;

        first.create(b"a").unwrap();
        second.create(b"b").unwrap();
        first.commit().await.unwrap();

        assert!(matches!(
            second.commit().await,
            Err(CryptoError::HeadMoved {
                expected: 0,
                actual: 1,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_empty_commit_is_noop() {
        let (store, keys, feed) = setup();
        let tx = open(&store, &keys, feed).await;
        let receipt = tx.commit().await.unwrap();
        assert_eq!(receipt.length, 0);
        assert!(store.list_feeds().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pinned_read_sees_old_version() {
        let (store, keys, feed) = setup();
        let mut tx = open(&store, &keys, feed).await;
        let (id, key) = tx.create(b"v1").unwrap();
        tx.commit().await.unwrap();
        keys.register(key, feed, id);

        let mut tx = open(&store, &keys, feed).await;
        tx.set(id, b"v2").unwrap();
        tx.commit().await.unwrap();

        let pinned =
            EncryptedTransaction::open_read_only(store.clone(), keys.clone(), feed, Some(1))
                .await
                .unwrap();
        assert_eq!(pinned.get(id).await.unwrap(), b"v1");
        assert!(open(&store, &keys, feed).await.get(id).await.unwrap() == b"v2");
    }

    #[tokio::test]
    async fn test_pin_past_end_is_rejected() {
        let (store, keys, feed) = setup();
        let result =
            EncryptedTransaction::open(store, keys, feed, Some(3), CipherKind::ChaCha20).await;
        assert!(matches!(
            result,
            Err(CryptoError::VersionOutOfRange { version: 3, length: 0, .. })
        ));
    }

    #[tokio::test]
    async fn test_read_only_rejects_writes() {
        let (store, keys, feed) = setup();
        let mut tx = EncryptedTransaction::open_read_only(store, keys, feed, None)
            .await
            .unwrap();
        assert!(matches!(tx.create(b"x"), Err(CryptoError::ReadOnly(_))));
    }

    #[tokio::test]
    async fn test_truncated_record_is_corruption_even_with_key() {
        let (store, keys, feed) = setup();
        store
            .append_blocks(&feed, 0, vec![Block::new(0, &b"ab"[..])])
            .await
            .unwrap();
        keys.register(SymmetricKey::generate(CipherKind::ChaCha20), feed, 0);

        let tx = open(&store, &keys, feed).await;
        assert!(matches!(
            tx.get(0).await,
            Err(CryptoError::Corrupted {
                cause: CoreError::TruncatedRecord { len: 2 },
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_aead_transaction_roundtrip() {
        let (store, keys, feed) = setup();
        let mut tx = EncryptedTransaction::open(
            store.clone(),
            keys.clone(),
            feed,
            None,
            CipherKind::ChaCha20Poly1305,
        )
        .await
        .unwrap();
        let (id, key) = tx.create(b"sealed").unwrap();
        assert_eq!(key.kind(), CipherKind::ChaCha20Poly1305);
        tx.commit().await.unwrap();

        keys.register(key, feed, id);
        assert_eq!(open(&store, &keys, feed).await.get(id).await.unwrap(), b"sealed");
    }
}
