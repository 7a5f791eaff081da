//! Scenario 5 (spec §8): LINKed keys rank by graph proximity when a hybrid
//! SEARCH's weights isolate the graph component (`alpha=0, beta=0, gamma=1`).

use crate::test_utils::*;
use serde_json::json;

#[test]
fn hybrid_search_with_graph_only_weights_ranks_by_proximity() {
    let dir = tempfile::tempdir().unwrap();
    let engine = build_engine(dir.path(), 4, 0);
    let mut c = ctx("agent-1");

    store(&engine, &mut c, "u", "fn u");
    store(&engine, &mut c, "v", "fn v");
    store(&engine, &mut c, "w", "fn w");
    link(&engine, &mut c, "u", "v", "calls");
    link(&engine, &mut c, "v", "w", "calls");

    let results = search(
        &engine,
        &mut c,
        json!({
            "mode": "hybrid",
            "query": "",
            "options": {"seeds": ["u"], "k": 3, "alpha": 0.0, "beta": 0.0, "gamma": 1.0},
        }),
    );
    let entries = results.as_array().unwrap();
    let keys: Vec<&str> = entries.iter().map(|e| e["key"].as_str().unwrap()).collect();
    assert_eq!(keys, vec!["u", "v", "w"]);
}

#[test]
fn link_is_idempotent_on_repeated_source_target_relation() {
    let dir = tempfile::tempdir().unwrap();
    let engine = build_engine(dir.path(), 4, 0);
    let mut c = ctx("agent-1");

    store(&engine, &mut c, "u", "fn u");
    store(&engine, &mut c, "v", "fn v");
    link(&engine, &mut c, "u", "v", "calls");
    link(&engine, &mut c, "u", "v", "calls");

    let neighbors = search(
        &engine,
        &mut c,
        json!({"mode": "graph", "options": {"seeds": ["u"], "k": 10}}),
    );
    let entries = neighbors.as_array().unwrap();
    let v_count = entries.iter().filter(|e| e["key"] == "v").count();
    assert_eq!(v_count, 1, "a repeated LINK must not create a duplicate edge");
}
