//! # SealGraph Crypto
//!
//! Encrypted transactions over feeds, and the rules that move keys between
//! the key store and the graph.
//!
//! ## Overview
//!
//! - [`EncryptedTransaction`] seals and opens records of a single feed. It
//!   buffers writes and appends them atomically at commit.
//! - [`CryptoCore`] reads and writes whole vertices. Keys of newly created
//!   objects are registered after commit, and keys carried on edges are
//!   registered whenever a vertex is read.
//!
//! ## Access Model
//!
//! Holding an object's key is read access to it. Writing a vertex embeds the
//! keys of its targets into its edges (unless an edge is enveloped), so
//! anyone who can read a vertex can read what it points to. There is no other
//! way to obtain a child's key through the graph.

pub mod core;
pub mod error;
pub mod transaction;

pub use crate::core::CryptoCore;
pub use error::{CryptoError, Result};
pub use transaction::{CommitReceipt, EncryptedTransaction};
