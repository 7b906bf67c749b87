//! Vertex record encoding.
//!
//! A vertex is stored as a CBOR map with small integer keys:
//!
//! ```text
//! vertex { 0: type, 1: content, 2: [edge, ...] }
//! edge   { 0: label, 1: target, 2: feed, 3: version, 4: view,
//!          5: [cipher, key bytes], 6: envelope }
//! ```
//!
//! Absent optional fields are omitted. The id, feed and version of the
//! vertex itself are never stored: they are facts about where the record
//! lives, not part of it.

use ciborium::value::{Integer, Value};

use crate::content::Content;
use crate::crypto::{CipherKind, SymmetricKey};
use crate::error::{CoreError, Result};
use crate::types::FeedId;
use crate::vertex::{Edge, EdgeMetadata, Vertex};

mod keys {
    pub const TYPE: u64 = 0;
    pub const CONTENT: u64 = 1;
    pub const EDGES: u64 = 2;

    pub const LABEL: u64 = 0;
    pub const TARGET: u64 = 1;
    pub const FEED: u64 = 2;
    pub const VERSION: u64 = 3;
    pub const VIEW: u64 = 4;
    pub const KEY: u64 = 5;
    pub const ENVELOPE: u64 = 6;
}

/// Encode a vertex's content and edges.
pub fn encode_vertex(vertex: &Vertex) -> Result<Vec<u8>> {
    let mut entries = Vec::with_capacity(3);

    if let Some(content) = vertex.content() {
        entries.push((int(keys::TYPE), Value::Text(content.type_name().to_string())));
        entries.push((int(keys::CONTENT), Value::Bytes(content.encode()?)));
    }

    let edges = vertex.edges().iter().map(edge_to_value).collect();
    entries.push((int(keys::EDGES), Value::Array(edges)));

    let mut buf = Vec::new();
    ciborium::into_writer(&Value::Map(entries), &mut buf)
        .map_err(|e| CoreError::Encoding(e.to_string()))?;
    Ok(buf)
}

/// Decode a vertex record. The result is not marked persisted.
pub fn decode_vertex(bytes: &[u8]) -> Result<Vertex> {
    let value: Value =
        ciborium::from_reader(bytes).map_err(|e| CoreError::Decoding(e.to_string()))?;
    let map = as_map(&value, "vertex")?;

    let content = match (lookup(map, keys::TYPE), lookup(map, keys::CONTENT)) {
        (Some(Value::Text(type_name)), Some(Value::Bytes(data))) => {
            Some(Content::decode(type_name, data)?)
        }
        (None, None) => None,
        _ => return Err(malformed("vertex content")),
    };

    let edges = match lookup(map, keys::EDGES) {
        Some(Value::Array(items)) => items
            .iter()
            .map(value_to_edge)
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
        _ => return Err(malformed("vertex edges")),
    };

    Ok(Vertex::from_parts(content, edges))
}

fn edge_to_value(edge: &Edge) -> Value {
    let mut entries = vec![
        (int(keys::LABEL), Value::Text(edge.label.clone())),
        (int(keys::TARGET), int(edge.target)),
    ];
    if let Some(feed) = edge.feed {
        entries.push((int(keys::FEED), Value::Bytes(feed.as_bytes().to_vec())));
    }
    if let Some(version) = edge.version {
        entries.push((int(keys::VERSION), int(version)));
    }
    if let Some(view) = &edge.view {
        entries.push((int(keys::VIEW), Value::Text(view.clone())));
    }
    if let Some(key) = &edge.metadata.key {
        entries.push((
            int(keys::KEY),
            Value::Array(vec![
                int(u64::from(key.kind().as_byte())),
                Value::Bytes(key.as_bytes().to_vec()),
            ]),
        ));
    }
    if edge.metadata.envelope {
        entries.push((int(keys::ENVELOPE), Value::Bool(true)));
    }
    Value::Map(entries)
}

fn value_to_edge(value: &Value) -> Result<Edge> {
    let map = as_map(value, "edge")?;

    let label = match lookup(map, keys::LABEL) {
        Some(Value::Text(s)) => s.clone(),
        _ => return Err(malformed("edge label")),
    };
    let target = match lookup(map, keys::TARGET) {
        Some(Value::Integer(i)) => to_u64(*i, "edge target")?,
        _ => return Err(malformed("edge target")),
    };
    let feed = match lookup(map, keys::FEED) {
        Some(Value::Bytes(b)) => {
            Some(FeedId::try_from(b.as_slice()).map_err(|_| malformed("edge feed"))?)
        }
        None => None,
        _ => return Err(malformed("edge feed")),
    };
    let version = match lookup(map, keys::VERSION) {
        Some(Value::Integer(i)) => Some(to_u64(*i, "edge version")?),
        None => None,
        _ => return Err(malformed("edge version")),
    };
    let view = match lookup(map, keys::VIEW) {
        Some(Value::Text(s)) => Some(s.clone()),
        None => None,
        _ => return Err(malformed("edge view")),
    };
    let key = match lookup(map, keys::KEY) {
        Some(Value::Array(parts)) => Some(value_to_key(parts)?),
        None => None,
        _ => return Err(malformed("edge key")),
    };
    let envelope = match lookup(map, keys::ENVELOPE) {
        Some(Value::Bool(b)) => *b,
        None => false,
        _ => return Err(malformed("edge envelope")),
    };

    Ok(Edge {
        label,
        target,
        feed,
        version,
        view,
        metadata: EdgeMetadata { key, envelope },
    })
}

fn value_to_key(parts: &[Value]) -> Result<SymmetricKey> {
    match parts {
        [Value::Integer(kind), Value::Bytes(bytes)] => {
            let kind = to_u64(*kind, "key cipher")?;
            let kind = u8::try_from(kind)
                .ok()
                .and_then(CipherKind::from_byte)
                .ok_or(CoreError::UnknownCipher(kind))?;
            SymmetricKey::from_slice(kind, bytes)
        }
        _ => Err(malformed("edge key")),
    }
}

fn int(n: u64) -> Value {
    Value::Integer(n.into())
}

fn to_u64(i: Integer, what: &str) -> Result<u64> {
    u64::try_from(i).map_err(|_| malformed(what))
}

fn as_map<'a>(value: &'a Value, what: &str) -> Result<&'a [(Value, Value)]> {
    match value {
        Value::Map(entries) => Ok(entries),
        _ => Err(CoreError::Decoding(format!("{what}: expected map"))),
    }
}

fn lookup(map: &[(Value, Value)], key: u64) -> Option<&Value> {
    map.iter()
        .find(|(k, _)| matches!(k, Value::Integer(i) if u64::try_from(*i).ok() == Some(key)))
        .map(|(_, v)| v)
}

fn malformed(what: &str) -> CoreError {
    CoreError::Decoding(format!("malformed {what}"))
}
