//! Typed result payloads for the five primitives (spec §4.F).

use agrama_core::{Item, Key};
use agrama_query::ScoredResult;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct StoreIndexed {
    pub lexical: bool,
    pub vector: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoreResult {
    pub key: Key,
    pub version: u64,
    pub indexed: StoreIndexed,
}

#[derive(Debug, Clone, Serialize)]
pub struct RetrieveResult {
    pub value: String,
    pub metadata: agrama_core::Metadata,
    pub version: u64,
    pub created_at: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<HistoryEntry>>,
}

/// One prior version surfaced by `{include_history: true}`. Mirrors the
/// top-level value's UTF-8 projection rather than serializing the raw
/// `Vec<u8>` as a JSON byte array.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub value: String,
    pub metadata: agrama_core::Metadata,
    pub version: u64,
    pub created_at: u64,
}

impl From<Item> for HistoryEntry {
    fn from(item: Item) -> Self {
        HistoryEntry {
            value: String::from_utf8_lossy(&item.value).into_owned(),
            metadata: item.metadata,
            version: item.version,
            created_at: item.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResultEntry {
    pub key: Key,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_scores: Option<agrama_query::ComponentScores>,
}

impl From<ScoredResult> for SearchResultEntry {
    fn from(r: ScoredResult) -> Self {
        SearchResultEntry {
            key: r.key,
            score: r.score,
            component_scores: r.component_scores,
        }
    }
}

pub type SearchResult = Vec<SearchResultEntry>;

#[derive(Debug, Clone, Serialize)]
pub struct LinkResult {
    pub source: Key,
    pub target: Key,
    pub relation: String,
    pub created_at: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransformResult {
    pub operation: String,
    pub output: serde_json::Value,
    pub elapsed_ns: u64,
}
