//! Core data model: [`Item`] and [`Edge`] (spec §3).

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::collections::HashMap;

/// A key: a UTF-8 string identifying one versioned record.
pub type Key = String;

/// Metadata attached to an Item or Edge: short string keys to JSON scalars/objects.
pub type Metadata = HashMap<String, Json>;

/// An immutable versioned record identified by a key (spec §3).
///
/// Items are never mutated in place; "update" means appending a new
/// version with the same key and a higher [`Item::version`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    /// The key this Item is a version of.
    pub key: Key,
    /// Opaque value bytes (UTF-8 is typical but not required).
    pub value: Vec<u8>,
    /// Free-form metadata, enriched by the Primitive Engine with
    /// `agent_id`, `session_id`, `timestamp`, `provenance`.
    pub metadata: Metadata,
    /// Monotonic nanosecond timestamp, strictly increasing across the store.
    pub created_at: u64,
    /// Agent that produced this version.
    pub agent_id: String,
    /// Session the write belonged to.
    pub session_id: String,
    /// 1-based, per-key strictly monotonic version counter.
    pub version: u64,
    /// Optional fixed-dimension embedding for vector indexing.
    pub embedding: Option<Vec<f32>>,
}

impl Item {
    /// Metadata value for `metadata.type`, used by the lexical index's field
    /// weighting (spec §4.B). Falls back to `"default"`.
    pub fn type_hint(&self) -> &str {
        self.metadata
            .get("type")
            .and_then(Json::as_str)
            .unwrap_or("default")
    }
}

/// A directed, typed, labeled link between two keys (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Edge {
    /// Source key. Must already exist as an Item.
    pub source: Key,
    /// Target key. Must already exist as an Item.
    pub target: Key,
    /// Relation label, e.g. `depends_on`, `evolved_into`.
    pub relation: String,
    /// Non-negative edge weight, default 1.0.
    pub weight: f64,
    /// Free-form metadata.
    pub metadata: Metadata,
    /// Monotonic nanosecond timestamp of the (last) LINK call that produced
    /// this edge.
    pub created_at: u64,
}
