//! Typed request payloads for the five primitives (spec §4.F).

use agrama_core::{Key, Metadata};
use agrama_query::QueryMode;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct StoreRequest {
    pub key: Key,
    pub value: String,
    #[serde(default)]
    pub metadata: Option<Metadata>,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetrieveRequest {
    pub key: Key,
    #[serde(default)]
    pub include_history: bool,
    #[serde(default)]
    pub history_limit: Option<usize>,
    #[serde(default)]
    pub at_version: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchOptions {
    #[serde(default = "default_k")]
    pub k: usize,
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    #[serde(default)]
    pub beta: f64,
    #[serde(default)]
    pub gamma: f64,
    #[serde(default)]
    pub seeds: Vec<Key>,
    #[serde(default)]
    pub threshold: Option<f64>,
}

fn default_k() -> usize {
    10
}
fn default_alpha() -> f64 {
    1.0
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            k: default_k(),
            alpha: default_alpha(),
            beta: 0.0,
            gamma: 0.0,
            seeds: Vec::new(),
            threshold: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchModeWire {
    Lexical,
    Semantic,
    Graph,
    Hybrid,
}

impl From<SearchModeWire> for QueryMode {
    fn from(mode: SearchModeWire) -> Self {
        match mode {
            SearchModeWire::Lexical => QueryMode::Lexical,
            SearchModeWire::Semantic => QueryMode::Semantic,
            SearchModeWire::Graph => QueryMode::Graph,
            SearchModeWire::Hybrid => QueryMode::Hybrid,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub query_embedding: Option<Vec<f32>>,
    pub mode: SearchModeWire,
    #[serde(default)]
    pub options: SearchOptions,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinkRequest {
    pub source: Key,
    pub target: Key,
    pub relation: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

fn default_weight() -> f64 {
    1.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransformRequest {
    pub operation: String,
    pub input: serde_json::Value,
    #[serde(default)]
    pub parameters: serde_json::Value,
}
