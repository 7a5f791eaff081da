//! Request/response shapes for the Hybrid Query Engine (spec §4.E).

use agrama_core::Key;
use serde::Serialize;

/// Which component(s) a SEARCH call invokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    Lexical,
    Semantic,
    Graph,
    Hybrid,
}

/// Linear-combination coefficients and shared query parameters.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    pub k: usize,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub seeds: Vec<Key>,
    pub threshold: Option<f64>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        QueryOptions {
            k: 10,
            alpha: 1.0,
            beta: 0.0,
            gamma: 0.0,
            seeds: Vec::new(),
            threshold: None,
        }
    }
}

/// Per-component scores, populated only for `hybrid` mode results.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ComponentScores {
    pub lexical: f64,
    pub vector: f64,
    pub graph: f64,
}

/// One ranked result.
#[derive(Debug, Clone)]
pub struct ScoredResult {
    pub key: Key,
    pub score: f64,
    pub component_scores: Option<ComponentScores>,
}
