//! # SealGraph Core
//!
//! Pure primitives for SealGraph: feed identifiers, symmetric keys, sealed
//! records, the key store, and the vertex/edge model.
//!
//! This crate contains no I/O. Storage lives in `sealgraph-store`, and the
//! transaction layer that ties records to feeds lives in `sealgraph-crypto`.
//!
//! ## Key Types
//!
//! - [`FeedId`] - Identifier of an append-only log of blocks
//! - [`SymmetricKey`] - Per-object key; holding it is read access
//! - [`KeyStore`] - Registry of keys addressed by `(feed, index)`
//! - [`Vertex`] / [`Edge`] - The graph model
//! - [`ShareObject`] - Capability content
//!
//! ## Records
//!
//! Every stored block is `plaintext || crc32`, optionally encrypted with the
//! record's position as nonce. See [`record`].

pub mod codec;
pub mod content;
pub mod crypto;
pub mod error;
pub mod keystore;
pub mod record;
pub mod share;
pub mod types;
pub mod vertex;

pub use codec::{decode_vertex, encode_vertex};
pub use content::{Content, SimpleObject, SIMPLE_OBJECT};
pub use crypto::{CipherKind, Ed25519PublicKey, Keypair, RecordNonce, SymmetricKey};
pub use error::{CoreError, Result};
pub use keystore::KeyStore;
pub use record::{open_record, seal_record};
pub use share::{ShareObject, SHARE_LABEL, SHARE_OBJECT, SHARE_VIEW};
pub use types::{FeedId, ObjectRef};
pub use vertex::{Edge, EdgeMetadata, EdgeOptions, Vertex};
