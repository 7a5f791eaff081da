//! Drives the same scenarios through the line-delimited JSON-RPC dispatcher
//! (spec §4.G, §6), the surface `agrama serve` actually exposes over stdio.

use agrama::{Dispatcher, DispatcherConfig, ExitReason, PrimitiveEngine};
use parking_lot::Mutex;
use serde_json::Value;
use std::io::{Cursor, Write};
use std::sync::Arc;

fn build_dispatcher(dir: &std::path::Path) -> Dispatcher {
    use agrama::{GraphIndex, HnswConfig, HnswIndex, HybridQueryEngine, LexicalIndex, Limits, ResultCache, StorageCore};

    let storage = Arc::new(StorageCore::open(dir.join("log")).unwrap().with_limits(Limits::default()));
    let lexical = Arc::new(LexicalIndex::new());
    let vector = Arc::new(HnswIndex::new(HnswConfig::new(4, 7)));
    let graph = Arc::new(GraphIndex::new());
    let query = Arc::new(HybridQueryEngine::new(storage.clone(), lexical.clone(), vector.clone(), graph.clone()));
    let cache = Arc::new(ResultCache::new(1024));
    let engine = Arc::new(PrimitiveEngine::new(storage, lexical, vector, graph, query, cache, 4));
    Dispatcher::new(engine, DispatcherConfig::default())
}

struct SharedBuf(Arc<Mutex<Vec<u8>>>);
impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().write(buf)
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn run_lines(dispatcher: &Dispatcher, lines: &str) -> Vec<Value> {
    let input = Cursor::new(lines.as_bytes().to_vec());
    let buf = Arc::new(Mutex::new(Vec::new()));
    let reason = dispatcher.run(input, SharedBuf(buf.clone()));
    assert_eq!(reason, ExitReason::CleanShutdown);

    let out = buf.lock().clone();
    String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[test]
fn initialize_store_search_over_stdio() {
    let dir = tempfile::tempdir().unwrap();
    let dispatcher = build_dispatcher(dir.path());

    let lines = concat!(
        "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"initialize\",\"params\":{\"clientInfo\":{\"name\":\"claude\"}}}\n",
        "{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"primitives/call\",\"params\":{\"name\":\"store\",\"arguments\":{\"key\":\"f1\",\"value\":\"def calculateArea(): pass\",\"metadata\":{\"type\":\"function\"}}}}\n",
        "{\"jsonrpc\":\"2.0\",\"id\":3,\"method\":\"primitives/call\",\"params\":{\"name\":\"search\",\"arguments\":{\"query\":\"calculate\",\"mode\":\"lexical\",\"options\":{\"k\":3}}}}\n",
    );
    let responses = run_lines(&dispatcher, lines);
    assert_eq!(responses.len(), 3);
    assert_eq!(responses[0]["id"], 1);
    assert_eq!(responses[1]["result"]["content"][0]["key"], "f1");
    assert_eq!(responses[2]["result"]["content"][0][0]["key"], "f1");
}

#[test]
fn malformed_line_does_not_drop_the_connection() {
    let dir = tempfile::tempdir().unwrap();
    let dispatcher = build_dispatcher(dir.path());

    let lines = concat!(
        "not json\n",
        "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"initialize\",\"params\":{\"clientInfo\":{\"name\":\"claude\"}}}\n",
    );
    let responses = run_lines(&dispatcher, lines);
    assert_eq!(responses.len(), 2);
    assert!(responses[0]["error"].is_object());
    assert_eq!(responses[1]["id"], 1);
}
