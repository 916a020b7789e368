//! The event record — an ordered field map produced fresh per lifecycle
//! event, patched once, handed to the router, and never retained.
//!
//! `serde_json`'s `preserve_order` feature is enabled workspace-wide, so the
//! map keeps insertion order. Patch semantics depend on that: key-rename
//! collisions resolve in settings insertion order.

use serde_json::Value;

/// An ordered mapping of field name to scalar/nested value.
pub type Record = serde_json::Map<String, Value>;

/// Build a record from `(name, value)` pairs, preserving order.
pub fn record_from<I, K, V>(fields: I) -> Record
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    fields
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
