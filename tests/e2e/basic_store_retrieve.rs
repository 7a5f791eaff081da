//! Scenario 1 (spec §8): STORE then RETRIEVE round-trips the value and
//! stamps metadata with the calling agent's identity.

use crate::test_utils::*;

#[test]
fn store_then_retrieve_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let engine = build_engine(dir.path(), 4, 0);
    let mut c = ctx("agent-1");

    let stored = store(&engine, &mut c, "a", "hello");
    assert_eq!(stored["version"], 1);
    assert_eq!(stored["indexed"]["lexical"], true);
    assert_eq!(stored["indexed"]["vector"], false);

    let found = retrieve(&engine, &mut c, serde_json::json!({"key": "a"}));
    assert_eq!(found["value"], "hello");
    assert_eq!(found["version"], 1);
    assert_eq!(found["metadata"]["agent_id"], "agent-1");
    assert_eq!(found["metadata"]["session_id"], "session-1");
    assert_eq!(found["metadata"]["provenance"], "store");
    assert!(found["metadata"]["timestamp"].is_u64());
}

#[test]
fn retrieve_of_unknown_key_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let engine = build_engine(dir.path(), 4, 0);
    let mut c = ctx("agent-1");

    let err = engine
        .call("retrieve", serde_json::json!({"key": "missing"}), &mut c)
        .unwrap_err();
    assert!(matches!(err, agrama::Error::NotFound(_)));
}
