//! Scenario 2 (spec §8): repeated STOREs on one key produce a monotonic
//! version sequence, and history is returned most-recent-first.

use crate::test_utils::*;
use serde_json::json;

#[test]
fn three_stores_then_history() {
    let dir = tempfile::tempdir().unwrap();
    let engine = build_engine(dir.path(), 4, 0);
    let mut c = ctx("agent-1");

    for value in ["1", "2", "3"] {
        store(&engine, &mut c, "x", value);
    }

    let latest = retrieve(&engine, &mut c, json!({"key": "x"}));
    assert_eq!(latest["value"], "3");
    assert_eq!(latest["version"], 3);

    let with_history = retrieve(
        &engine,
        &mut c,
        json!({"key": "x", "include_history": true, "history_limit": 2}),
    );
    let history = with_history["history"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["value"], "3");
    assert_eq!(history[1]["value"], "2");
}

#[test]
fn history_is_contiguous_in_version() {
    let dir = tempfile::tempdir().unwrap();
    let engine = build_engine(dir.path(), 4, 0);
    let mut c = ctx("agent-1");

    for value in ["1", "2", "3", "4"] {
        store(&engine, &mut c, "x", value);
    }

    let with_history = retrieve(&engine, &mut c, json!({"key": "x", "include_history": true, "history_limit": 10}));
    let history = with_history["history"].as_array().unwrap();
    assert_eq!(history.len(), 4);
    let mut versions: Vec<u64> = history.iter().map(|item| item["version"].as_u64().unwrap()).collect();
    versions.sort_unstable();
    assert_eq!(versions, vec![1, 2, 3, 4]);
}
