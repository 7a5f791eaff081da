//! Scenario 4 (spec §8): seeded HNSW over `D=4` embeddings returns the
//! exact nearest neighbor for a query close to one stored vector.

use crate::test_utils::*;
use serde_json::json;

#[test]
fn nearest_embedding_wins_top_one() {
    let dir = tempfile::tempdir().unwrap();
    let engine = build_engine(dir.path(), 4, 7);
    let mut c = ctx("agent-1");

    store_with(&engine, &mut c, "a", "vector a", json!({}), Some(vec![1.0, 0.0, 0.0, 0.0]));
    store_with(&engine, &mut c, "b", "vector b", json!({}), Some(vec![0.9, 0.1, 0.0, 0.0]));
    store_with(&engine, &mut c, "c", "vector c", json!({}), Some(vec![0.0, 0.0, 1.0, 0.0]));

    let results = search(
        &engine,
        &mut c,
        json!({"mode": "semantic", "query_embedding": [1.0, 0.0, 0.0, 0.0], "options": {"k": 1}}),
    );
    let entries = results.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["key"], "a");
}

#[test]
fn dimension_mismatch_on_store_is_rejected_and_indexes_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let engine = build_engine(dir.path(), 4, 7);
    let mut c = ctx("agent-1");

    let err = engine
        .call(
            "store",
            json!({"key": "bad", "value": "x", "embedding": [1.0, 0.0]}),
            &mut c,
        )
        .unwrap_err();
    assert!(matches!(
        err,
        agrama::Error::DimensionMismatch { expected: 4, actual: 2 }
    ));

    let err = engine.call("retrieve", json!({"key": "bad"}), &mut c).unwrap_err();
    assert!(matches!(err, agrama::Error::NotFound(_)));
}
