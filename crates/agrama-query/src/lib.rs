//! Hybrid Query Engine: fuses lexical, vector and graph-proximity scores
//! (spec §4.E).

pub mod engine;
pub mod types;

pub use engine::HybridQueryEngine;
pub use types::{ComponentScores, QueryMode, QueryOptions, ScoredResult};

#[cfg(test)]
mod tests {
    use super::*;
    use agrama_core::{Limits, Metadata};
    use agrama_graph::GraphIndex;
    use agrama_lexical::LexicalIndex;
    use agrama_storage::StorageCore;
    use agrama_vector::HnswIndex;
    use std::sync::Arc;

    fn engine(dir: &std::path::Path) -> HybridQueryEngine {
        let storage = Arc::new(StorageCore::open(&dir.join("log")).unwrap().with_limits(Limits::default()));
        let lexical = Arc::new(LexicalIndex::new());
        let vector = Arc::new(HnswIndex::new(agrama_vector::HnswConfig::new(4, 1)));
        let graph = Arc::new(GraphIndex::new());
        HybridQueryEngine::new(storage, lexical, vector, graph)
    }

    #[test]
    fn lexical_mode_requires_text() {
        let dir = tempfile::tempdir().unwrap();
        let e = engine(dir.path());
        let err = e
            .query(QueryMode::Lexical, None, None, &QueryOptions::default())
            .unwrap_err();
        assert!(matches!(err, agrama_core::Error::InvalidInput(_)));
    }

    #[test]
    fn semantic_mode_requires_embedding() {
        let dir = tempfile::tempdir().unwrap();
        let e = engine(dir.path());
        let err = e
            .query(QueryMode::Semantic, Some("hello"), None, &QueryOptions::default())
            .unwrap_err();
        assert!(matches!(err, agrama_core::Error::InvalidInput(_)));
    }

    #[test]
    fn graph_mode_with_no_seeds_is_empty_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let e = engine(dir.path());
        let results = e.query(QueryMode::Graph, None, None, &QueryOptions::default()).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn hybrid_merges_lexical_and_vector_components() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(StorageCore::open(&dir.join("log")).unwrap().with_limits(Limits::default()));
        let lexical = Arc::new(LexicalIndex::new());
        let vector = Arc::new(HnswIndex::new(agrama_vector::HnswConfig::new(4, 1)));
        let graph = Arc::new(GraphIndex::new());

        storage
            .put(
                "fn_a",
                b"fn parse_tokens()".to_vec(),
                Metadata::new(),
                "agent",
                "session",
                None,
            )
            .unwrap();
        lexical.index("fn_a", "fn parse_tokens()", "function", 1);
        vector.insert("fn_a", vec![1.0, 0.0, 0.0, 0.0]).unwrap();
        graph.register("fn_a");

        let e = HybridQueryEngine::new(storage, lexical, vector, graph);
        let options = QueryOptions {
            k: 5,
            alpha: 0.5,
            beta: 0.5,
            gamma: 0.0,
            seeds: Vec::new(),
            threshold: None,
        };
        let results = e
            .query(QueryMode::Hybrid, Some("parse_tokens"), Some(&[1.0, 0.0, 0.0, 0.0]), &options)
            .unwrap();
        assert_eq!(results[0].key, "fn_a");
        assert!(results[0].component_scores.is_some());
    }
}
