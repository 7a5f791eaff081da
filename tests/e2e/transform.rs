//! Scenario 6 (spec §8): TRANSFORM `parse_functions` extracts function
//! descriptors from source text.

use crate::test_utils::*;
use serde_json::json;

#[test]
fn parse_functions_finds_two_function_names() {
    let dir = tempfile::tempdir().unwrap();
    let engine = build_engine(dir.path(), 4, 0);
    let mut c = ctx("agent-1");

    let result = transform(
        &engine,
        &mut c,
        "parse_functions",
        json!("def foo(): pass\ndef bar(): pass"),
    );
    let functions = result["output"].as_array().unwrap();
    assert_eq!(functions.len(), 2);
    let names: Vec<&str> = functions.iter().map(|f| f["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["foo", "bar"]);
}

#[test]
fn unknown_operation_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let engine = build_engine(dir.path(), 4, 0);
    let mut c = ctx("agent-1");

    let err = engine
        .call("transform", json!({"operation": "does_not_exist", "input": "x"}), &mut c)
        .unwrap_err();
    assert!(matches!(err, agrama::Error::UnknownOperation(_)));
}
