//! Scenario 3 (spec §8): a BM25 lexical SEARCH over stored function bodies
//! ranks exact-term matches above a non-matching document.

use crate::test_utils::*;
use serde_json::json;

#[test]
fn calculate_query_ranks_matching_functions_above_non_match() {
    let dir = tempfile::tempdir().unwrap();
    let engine = build_engine(dir.path(), 4, 0);
    let mut c = ctx("agent-1");

    store_with(
        &engine,
        &mut c,
        "f1",
        "def calculateDistance(a, b): return abs(a - b)",
        json!({"type": "function"}),
        None,
    );
    store_with(
        &engine,
        &mut c,
        "f2",
        "def calculateArea(w, h): return w * h",
        json!({"type": "function"}),
        None,
    );
    store_with(&engine, &mut c, "f3", "def readFile(path): return open(path).read()", json!({"type": "function"}), None);

    let results = search(
        &engine,
        &mut c,
        json!({"query": "calculate", "mode": "lexical", "options": {"k": 3}}),
    );
    let entries = results.as_array().unwrap();
    let keys: Vec<&str> = entries.iter().map(|e| e["key"].as_str().unwrap()).collect();

    assert!(keys.contains(&"f1"));
    assert!(keys.contains(&"f2"));
    assert!(!keys.contains(&"f3"), "f3 has no 'calculate' term and must not match");

    let f1_rank = keys.iter().position(|k| *k == "f1").unwrap();
    let f2_rank = keys.iter().position(|k| *k == "f2").unwrap();
    assert!(f1_rank < 2 && f2_rank < 2);
}

#[test]
fn empty_query_returns_empty_results_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let engine = build_engine(dir.path(), 4, 0);
    let mut c = ctx("agent-1");
    store(&engine, &mut c, "f1", "def foo(): pass");

    let results = search(&engine, &mut c, json!({"query": "", "mode": "lexical", "options": {"k": 3}}));
    assert!(results.as_array().unwrap().is_empty());
}
