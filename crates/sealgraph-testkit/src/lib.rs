//! # SealGraph Testkit
//!
//! Testing utilities for SealGraph.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Exact sealed-record bytes for cross-implementation checks
//! - **Generators**: Proptest strategies for keys, feeds, edges and vertices
//! - **Fixtures**: A ready graph over an in-memory store, plus text helpers
//!
//! ## Golden Vectors
//!
//! ```rust
//! use sealgraph_testkit::vectors::verify_all_vectors;
//!
//! for (name, matches, hex) in verify_all_vectors() {
//!     assert!(matches, "{name}: {hex}");
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use sealgraph_core::{decode_vertex, encode_vertex};
//! use sealgraph_testkit::generators::vertex;
//!
//! proptest! {
//!     #[test]
//!     fn vertex_encoding_is_stable(v in vertex()) {
//!         prop_assert_eq!(decode_vertex(&encode_vertex(&v).unwrap()).unwrap(), v);
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use sealgraph_testkit::fixtures::{text_of, TestFixture};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let fixture = TestFixture::new();
//! let chain = fixture.put_chain(&["hello", "hola"], "next").await.unwrap();
//! let next = fixture.graph.query_at_vertex(&chain[0]).out("next").first().await.unwrap();
//! assert_eq!(next.as_ref().and_then(text_of), Some("hola"));
//! # });
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{multi_party_fixtures, text_of, text_vertex, TestFixture};
pub use vectors::{all_vectors, seal_vector, verify_all_vectors, GoldenVector};
