//! Proptest generators for property-based testing.

use proptest::prelude::*;

use sealgraph_core::{CipherKind, Edge, FeedId, Keypair, SimpleObject, SymmetricKey, Vertex};

/// Generate a random keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// Generate a random FeedId.
pub fn feed_id() -> impl Strategy<Value = FeedId> {
    any::<[u8; 32]>().prop_map(FeedId::from_bytes)
}

/// Generate a cipher kind.
pub fn cipher_kind() -> impl Strategy<Value = CipherKind> {
    prop_oneof![Just(CipherKind::ChaCha20), Just(CipherKind::ChaCha20Poly1305)]
}

/// Generate a symmetric key of either kind.
pub fn symmetric_key() -> impl Strategy<Value = SymmetricKey> {
    (cipher_kind(), any::<[u8; 32]>()).prop_map(|(kind, bytes)| SymmetricKey::from_bytes(kind, bytes))
}

/// Generate a feed name.
pub fn feed_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,31}".prop_map(String::from)
}

/// Generate an edge label.
pub fn label() -> impl Strategy<Value = String> {
    "[a-z]{1,12}".prop_map(String::from)
}

/// Generate simple content with up to `max_fields` entries.
pub fn simple_object(max_fields: usize) -> impl Strategy<Value = SimpleObject> {
    prop::collection::btree_map("[a-z]{1,8}", ".{0,32}", 0..=max_fields).prop_map(|fields| {
        fields
            .into_iter()
            .fold(SimpleObject::new(), |obj, (k, v)| obj.set(k, v))
    })
}

/// Generate an edge, optionally carrying a feed, version, view and key.
pub fn edge() -> impl Strategy<Value = Edge> {
    (
        label(),
        0u64..1000,
        proptest::option::of(feed_id()),
        proptest::option::of(1u64..1000),
        proptest::option::of("[A-Z][a-zA-Z]{0,15}"),
        proptest::option::of(symmetric_key()),
        any::<bool>(),
    )
        .prop_map(|(label, target, feed, version, view, key, envelope)| {
            let mut edge = Edge::new(label, target);
            edge.feed = feed;
            edge.version = version;
            edge.view = view;
            edge.metadata.key = key;
            edge.metadata.envelope = envelope;
            edge
        })
}

/// Generate an unpersisted vertex with optional simple content and some edges.
pub fn vertex() -> impl Strategy<Value = Vertex> {
    (
        proptest::option::of(simple_object(8)),
        prop::collection::vec(edge(), 0..6),
    )
        .prop_map(|(content, edges)| {
            let mut vertex = match content {
                Some(content) => Vertex::with_content(content),
                None => Vertex::new(),
            };
            for edge in edges {
                vertex.add_edge(edge);
            }
            vertex
        })
}

/// Generate record plaintext of at most `max_len` bytes.
pub fn plaintext(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}
