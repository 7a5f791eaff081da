//! Shared engine wiring for the end-to-end scenario tests.

use agrama::{
    Arena, CallContext, CancellationToken, GraphIndex, HnswConfig, HnswIndex, HybridQueryEngine,
    LexicalIndex, Limits, ObjectPool, PrimitiveEngine, ResultCache, StorageCore,
};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;

/// Build a fully-wired engine over a fresh temp directory, matching the
/// substrate `agrama-cli`'s `serve` assembles (spec §4.I).
pub fn build_engine(dir: &Path, dimension: usize, seed: u64) -> PrimitiveEngine {
    let storage = Arc::new(StorageCore::open(dir.join("log")).unwrap().with_limits(Limits::default()));
    let lexical = Arc::new(LexicalIndex::new());
    let vector = Arc::new(HnswIndex::new(HnswConfig::new(dimension, seed)));
    let graph = Arc::new(GraphIndex::new());
    let query = Arc::new(HybridQueryEngine::new(storage.clone(), lexical.clone(), vector.clone(), graph.clone()));
    let cache = Arc::new(ResultCache::new(1024));
    PrimitiveEngine::new(storage, lexical, vector, graph, query, cache, dimension)
}

/// A fresh per-call context for one simulated agent.
pub fn ctx(agent_id: &str) -> CallContext {
    let pool = Arc::new(ObjectPool::<Vec<u8>>::new(8));
    CallContext::new(agent_id.to_string(), "session-1".to_string(), CancellationToken::new(), Arena::new(pool))
}

pub fn store(engine: &PrimitiveEngine, ctx: &mut CallContext, key: &str, value: &str) -> Value {
    engine.call("store", json!({"key": key, "value": value}), ctx).unwrap()
}

pub fn store_with(
    engine: &PrimitiveEngine,
    ctx: &mut CallContext,
    key: &str,
    value: &str,
    metadata: Value,
    embedding: Option<Vec<f32>>,
) -> Value {
    let mut payload = json!({"key": key, "value": value, "metadata": metadata});
    if let Some(embedding) = embedding {
        payload["embedding"] = json!(embedding);
    }
    engine.call("store", payload, ctx).unwrap()
}

pub fn retrieve(engine: &PrimitiveEngine, ctx: &mut CallContext, payload: Value) -> Value {
    engine.call("retrieve", payload, ctx).unwrap()
}

pub fn search(engine: &PrimitiveEngine, ctx: &mut CallContext, payload: Value) -> Value {
    engine.call("search", payload, ctx).unwrap()
}

pub fn link(engine: &PrimitiveEngine, ctx: &mut CallContext, source: &str, target: &str, relation: &str) -> Value {
    engine
        .call("link", json!({"source": source, "target": target, "relation": relation}), ctx)
        .unwrap()
}

pub fn transform(engine: &PrimitiveEngine, ctx: &mut CallContext, operation: &str, input: Value) -> Value {
    engine.call("transform", json!({"operation": operation, "input": input}), ctx).unwrap()
}
