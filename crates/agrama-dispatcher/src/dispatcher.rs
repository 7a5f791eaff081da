//! The stdio request loop (spec §4.G, §5, §6): read line-delimited
//! JSON-RPC from standard input, dispatch each request through the
//! worker pool, and write responses back in per-request sequence order
//! through a single output mutex.

use crate::identity::IdentityRegistry;
use crate::types::{error_to_body, JsonRpcErrorBody, JsonRpcRequest, JsonRpcResponse, RpcErrorCode, JSONRPC_VERSION};
use crate::worker_pool::WorkerPool;
use agrama_core::Error as CoreError;
use agrama_pool::{Arena, ObjectPool};
use agrama_primitives::{CallContext, CancellationToken, PrimitiveEngine};
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

const MAX_LINE_BYTES: usize = 8 * 1024 * 1024;
const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_QUEUE_CAPACITY: usize = 1024;
const WRITE_FAILURE_LIMIT: u64 = 3;

/// Runtime knobs for [`Dispatcher::run`] (spec §4.G, §5, §6 CLI flags).
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub worker_count: usize,
    pub queue_capacity: usize,
    pub call_timeout: Duration,
    pub max_line_bytes: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        DispatcherConfig {
            worker_count: std::thread::available_parallelism().map(|n| n.get()).unwrap_or(2),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            max_line_bytes: MAX_LINE_BYTES,
        }
    }
}

/// Why [`Dispatcher::run`] returned (spec §6 "Exit codes").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// EOF on input, nothing outstanding.
    CleanShutdown,
    /// `StorageCorrupt`, or three consecutive `WriteFailed`s, drained.
    Fatal,
}

pub struct Dispatcher {
    engine: Arc<PrimitiveEngine>,
    identities: IdentityRegistry,
    pool: WorkerPool,
    arena_pool: Arc<ObjectPool<Vec<u8>>>,
    config: DispatcherConfig,
    sequence: AtomicU64,
    consecutive_write_failures: Arc<AtomicU64>,
    fatal: Arc<AtomicBool>,
}

impl Dispatcher {
    pub fn new(engine: Arc<PrimitiveEngine>, config: DispatcherConfig) -> Self {
        let pool = WorkerPool::new(config.worker_count, config.queue_capacity);
        Dispatcher {
            engine,
            identities: IdentityRegistry::new(),
            pool,
            arena_pool: Arc::new(ObjectPool::new(config.worker_count.max(8))),
            config,
            sequence: AtomicU64::new(0),
            consecutive_write_failures: Arc::new(AtomicU64::new(0)),
            fatal: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Read requests from `input` until EOF or a fatal condition, writing
    /// responses to `output`. Blocks until every in-flight call has
    /// completed and flushed.
    pub fn run<R: BufRead, W: Write + Send + 'static>(&self, input: R, output: W) -> ExitReason {
        let output = Arc::new(Mutex::new(output));
        let (complete_tx, complete_rx) = crossbeam_channel::unbounded::<(u64, Option<String>)>();

        let writer = std::thread::Builder::new()
            .name("agrama-writer".into())
            .spawn(move || write_in_order(complete_rx, output))
            .expect("failed to spawn writer thread");

        for line in input.lines() {
            if self.fatal.load(Ordering::SeqCst) {
                break;
            }
            let line = match line {
                Ok(l) => l,
                Err(_) => break,
            };
            if line.trim().is_empty() {
                continue;
            }
            self.handle_line(line, &complete_tx);
        }

        drop(complete_tx);
        let _ = writer.join();

        if self.fatal.load(Ordering::SeqCst) {
            ExitReason::Fatal
        } else {
            ExitReason::CleanShutdown
        }
    }

    fn handle_line(&self, line: String, tx: &Sender<(u64, Option<String>)>) {
        if line.len() > self.config.max_line_bytes {
            let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
            self.reply_error(tx, seq, None, RpcErrorCode::InvalidRequest, "line exceeds maximum length");
            return;
        }

        let request: JsonRpcRequest = match serde_json::from_str(&line) {
            Ok(r) => r,
            Err(e) => {
                let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
                self.reply_error(tx, seq, None, RpcErrorCode::ParseError, &e.to_string());
                return;
            }
        };

        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        let id = request.id.clone();
        let is_notification = id.is_none();

        if request.jsonrpc.as_deref() != Some(JSONRPC_VERSION) || request.method.is_none() {
            if !is_notification {
                self.reply_error(tx, seq, id, RpcErrorCode::InvalidRequest, "missing jsonrpc/method");
            } else {
                let _ = tx.send((seq, None));
            }
            return;
        }
        let method = request.method.unwrap();

        match method.as_str() {
            "initialized" => {
                let _ = tx.send((seq, None));
            }
            "initialize" => {
                let client_name = request
                    .params
                    .as_ref()
                    .and_then(|p| p.get("clientInfo"))
                    .and_then(|c| c.get("name"))
                    .and_then(|n| n.as_str())
                    .unwrap_or("anonymous-agent")
                    .to_string();
                let identity = self.identities.initialize(&client_name);
                let result = json!({
                    "protocolVersion": request
                        .params
                        .as_ref()
                        .and_then(|p| p.get("protocolVersion"))
                        .cloned()
                        .unwrap_or(json!("2024-11-05")),
                    "capabilities": {},
                    "serverInfo": {"name": "agrama", "version": env!("CARGO_PKG_VERSION")},
                    "agentId": identity.agent_id,
                    "sessionId": identity.session_id,
                });
                let _ = tx.send((seq, Some(ok_line(id, result))));
            }
            "primitives/list" => {
                let _ = tx.send((seq, Some(ok_line(id, primitives_catalog()))));
            }
            "tools/list" => {
                let _ = tx.send((seq, Some(ok_line(id, tools_catalog()))));
            }
            "primitives/call" => self.dispatch_call(seq, id, request.params, tx, false),
            "tools/call" => self.dispatch_call(seq, id, request.params, tx, true),
            other => {
                if !is_notification {
                    self.reply_error(
                        tx,
                        seq,
                        id,
                        RpcErrorCode::MethodNotFound,
                        &format!("unknown method: {other}"),
                    );
                } else {
                    let _ = tx.send((seq, None));
                }
            }
        }
    }

    fn dispatch_call(
        &self,
        seq: u64,
        id: Option<Value>,
        params: Option<Value>,
        tx: &Sender<(u64, Option<String>)>,
        legacy: bool,
    ) {
        let params = params.unwrap_or(Value::Null);
        let name_field = params.get("name").and_then(|v| v.as_str()).map(str::to_string);
        let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

        let Some(name_field) = name_field else {
            self.reply_error(tx, seq, id, RpcErrorCode::InvalidParams, "missing params.name");
            return;
        };

        let (primitive, arguments) = if legacy {
            match legacy_tool_call(&name_field, arguments) {
                Ok(mapped) => mapped,
                Err(msg) => {
                    self.reply_error(tx, seq, id, RpcErrorCode::MethodNotFound, &msg);
                    return;
                }
            }
        } else {
            (name_field, arguments)
        };

        let identity = self.identities.current().unwrap_or_else(|| crate::identity::Identity {
            agent_id: "anonymous-agent".to_string(),
            session_id: "anonymous-session".to_string(),
        });

        let engine = self.engine.clone();
        let arena_pool = self.arena_pool.clone();
        let call_timeout = self.config.call_timeout;
        let tx = tx.clone();
        let write_failures = self.consecutive_write_failures.clone();
        let fatal = self.fatal.clone();

        let job: Box<dyn FnOnce() + Send + 'static> = Box::new(move || {
            let cancellation = CancellationToken::new();
            let timer_token = cancellation.clone();
            let timer = std::thread::Builder::new()
                .name("agrama-call-timeout".into())
                .spawn(move || {
                    std::thread::sleep(call_timeout);
                    timer_token.cancel();
                });
            if let Ok(timer) = timer {
                drop(timer);
            }

            let mut ctx = CallContext::new(
                identity.agent_id.clone(),
                identity.session_id.clone(),
                cancellation,
                Arena::new(arena_pool),
            );
            let outcome = engine.call(&primitive, arguments, &mut ctx);

            match &outcome {
                Ok(_) => write_failures.store(0, Ordering::SeqCst),
                Err(CoreError::WriteFailed(_)) => {
                    if write_failures.fetch_add(1, Ordering::SeqCst) + 1 >= WRITE_FAILURE_LIMIT {
                        fatal.store(true, Ordering::SeqCst);
                    }
                }
                Err(CoreError::StorageCorrupt(_)) => fatal.store(true, Ordering::SeqCst),
                Err(_) => write_failures.store(0, Ordering::SeqCst),
            }

            let response = match outcome {
                Ok(value) => JsonRpcResponse::success(id, json!({"content": [value]})),
                Err(e) => JsonRpcResponse::failure(id, error_to_body(&e)),
            };
            let line = serde_json::to_string(&response).unwrap_or_else(|_| {
                "{\"jsonrpc\":\"2.0\",\"id\":null,\"error\":{\"code\":-32603,\"message\":\"response encoding failed\"}}"
                    .to_string()
            });
            let _ = tx.send((seq, Some(line)));
        });

        if let Err(_busy) = self.pool.submit(job) {
            self.reply_error(tx, seq, None, RpcErrorCode::Busy, "call queue full");
        }
    }

    fn reply_error(
        &self,
        tx: &Sender<(u64, Option<String>)>,
        seq: u64,
        id: Option<Value>,
        code: RpcErrorCode,
        message: &str,
    ) {
        let body = JsonRpcErrorBody {
            code: code.code(),
            message: message.to_string(),
            data: None,
        };
        let line = serde_json::to_string(&JsonRpcResponse::failure(id, body)).expect("error body always encodes");
        let _ = tx.send((seq, Some(line)));
    }
}

fn ok_line(id: Option<Value>, result: Value) -> String {
    serde_json::to_string(&JsonRpcResponse::success(id, result)).expect("result always encodes")
}

/// Maps legacy tool names onto the five primitives (spec §6: `read_code`
/// → RETRIEVE, `write_code` → STORE, `get_context` → RETRIEVE with
/// aggregated metadata).
fn legacy_tool_call(name: &str, arguments: Value) -> Result<(String, Value), String> {
    match name {
        "read_code" => Ok(("retrieve".to_string(), arguments)),
        "write_code" => Ok(("store".to_string(), arguments)),
        "get_context" => {
            let mut arguments = arguments;
            if let Value::Object(ref mut map) = arguments {
                map.entry("include_history").or_insert(Value::Bool(true));
            }
            Ok(("retrieve".to_string(), arguments))
        }
        other => Err(format!("unknown tool: {other}")),
    }
}

fn primitives_catalog() -> Value {
    json!({"primitives": [
        {"name": "store", "description": "Persist a new version of a key.", "inputSchema": {"type": "object", "required": ["key", "value"]}},
        {"name": "retrieve", "description": "Read the current or a historical version of a key.", "inputSchema": {"type": "object", "required": ["key"]}},
        {"name": "search", "description": "Lexical, semantic, graph, or hybrid search.", "inputSchema": {"type": "object", "required": ["mode"]}},
        {"name": "link", "description": "Create or update a typed edge between two keys.", "inputSchema": {"type": "object", "required": ["source", "target", "relation"]}},
        {"name": "transform", "description": "Run a named text transform over a value.", "inputSchema": {"type": "object", "required": ["operation", "input"]}},
    ]})
}

fn tools_catalog() -> Value {
    json!({"tools": [
        {"name": "read_code", "description": "Legacy alias for retrieve."},
        {"name": "write_code", "description": "Legacy alias for store."},
        {"name": "get_context", "description": "Legacy alias for retrieve with history aggregated."},
    ]})
}

/// Buffers out-of-order completions and flushes them in sequence order
/// (spec §5 "the writer flushes pending responses in sequence order").
fn write_in_order<W: Write>(rx: crossbeam_channel::Receiver<(u64, Option<String>)>, output: Arc<Mutex<W>>) {
    let mut pending: BTreeMap<u64, Option<String>> = BTreeMap::new();
    let mut next = 0u64;

    while let Ok((seq, line)) = rx.recv() {
        pending.insert(seq, line);
        while let Some(entry) = pending.remove(&next) {
            if let Some(line) = entry {
                let mut out = output.lock();
                let _ = writeln!(out, "{line}");
                let _ = out.flush();
            }
            next += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agrama_core::Limits;
    use agrama_graph::GraphIndex;
    use agrama_lexical::LexicalIndex;
    use agrama_pool::ResultCache;
    use agrama_query::HybridQueryEngine;
    use agrama_storage::StorageCore;
    use agrama_vector::{HnswConfig, HnswIndex};
    use std::io::Cursor;

    fn build_dispatcher(dir: &std::path::Path) -> Dispatcher {
        let storage = Arc::new(StorageCore::open(dir.join("log")).unwrap().with_limits(Limits::default()));
        let lexical = Arc::new(LexicalIndex::new());
        let vector = Arc::new(HnswIndex::new(HnswConfig::new(4, 7)));
        let graph = Arc::new(GraphIndex::new());
        let query = Arc::new(HybridQueryEngine::new(storage.clone(), lexical.clone(), vector.clone(), graph.clone()));
        let cache = Arc::new(ResultCache::new(1024));
        let engine = Arc::new(PrimitiveEngine::new(storage, lexical, vector, graph, query, cache, 4));
        Dispatcher::new(engine, DispatcherConfig::default())
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

    /// An owned, `'static`, `Send` writer over a shared buffer, so tests
    /// can hand `Dispatcher::run` a sink and still inspect what it wrote.
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);
    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().write(buf)
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn initialize_then_store_then_retrieve() {
        let dir = tempfile::tempdir().unwrap();
        let dispatcher = build_dispatcher(dir.path());
        let lines = concat!(
            "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"initialize\",\"params\":{\"clientInfo\":{\"name\":\"claude\"}}}\n",
            "{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"primitives/call\",\"params\":{\"name\":\"store\",\"arguments\":{\"key\":\"a\",\"value\":\"hi\"}}}\n",
            "{\"jsonrpc\":\"2.0\",\"id\":3,\"method\":\"primitives/call\",\"params\":{\"name\":\"retrieve\",\"arguments\":{\"key\":\"a\"}}}\n",
        );
        let responses = run_lines(&dispatcher, lines);
        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[1]["result"]["content"][0]["version"], 1);
        assert_eq!(responses[2]["result"]["content"][0]["value"], "hi");
    }

    #[test]
    fn responses_preserve_request_order() {
        let dir = tempfile::tempdir().unwrap();
        let dispatcher = build_dispatcher(dir.path());
        let mut lines = String::new();
        for i in 0..20 {
            lines.push_str(&format!(
                "{{\"jsonrpc\":\"2.0\",\"id\":{i},\"method\":\"primitives/call\",\"params\":{{\"name\":\"store\",\"arguments\":{{\"key\":\"k{i}\",\"value\":\"v\"}}}}}}\n"
            ));
        }
        let responses = run_lines(&dispatcher, &lines);
        let ids: Vec<i64> = responses.iter().map(|r| r["id"].as_i64().unwrap()).collect();
        assert_eq!(ids, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn malformed_json_gets_parse_error_without_dropping_connection() {
        let dir = tempfile::tempdir().unwrap();
        let dispatcher = build_dispatcher(dir.path());
        let lines = "not json\n{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"primitives/list\"}\n";
        let responses = run_lines(&dispatcher, lines);
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["error"]["code"], -32700);
        assert!(responses[1]["result"]["primitives"].is_array());
    }

    #[test]
    fn unknown_method_is_method_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let dispatcher = build_dispatcher(dir.path());
        let lines = "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"bogus\"}\n";
        let responses = run_lines(&dispatcher, lines);
        assert_eq!(responses[0]["error"]["code"], -32601);
    }

    #[test]
    fn legacy_write_code_then_read_code_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let dispatcher = build_dispatcher(dir.path());
        let lines = concat!(
            "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/call\",\"params\":{\"name\":\"write_code\",\"arguments\":{\"key\":\"a\",\"value\":\"hi\"}}}\n",
            "{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"tools/call\",\"params\":{\"name\":\"read_code\",\"arguments\":{\"key\":\"a\"}}}\n",
        );
        let responses = run_lines(&dispatcher, lines);
        assert_eq!(responses[1]["result"]["content"][0]["value"], "hi");
    }

    #[test]
    fn notification_produces_no_response_line() {
        let dir = tempfile::tempdir().unwrap();
        let dispatcher = build_dispatcher(dir.path());
        let lines = concat!(
            "{\"jsonrpc\":\"2.0\",\"method\":\"initialized\"}\n",
            "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"primitives/list\"}\n",
        );
        let responses = run_lines(&dispatcher, lines);
        assert_eq!(responses.len(), 1);
    }

    #[test]
    fn oversized_line_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let dispatcher = build_dispatcher(dir.path());
        let huge_value = "x".repeat(9 * 1024 * 1024);
        let line = format!(
            "{{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"primitives/call\",\"params\":{{\"name\":\"store\",\"arguments\":{{\"key\":\"a\",\"value\":\"{huge_value}\"}}}}}}\n"
        );
        let responses = run_lines(&dispatcher, &line);
        assert_eq!(responses[0]["error"]["code"], -32600);
    }
}
