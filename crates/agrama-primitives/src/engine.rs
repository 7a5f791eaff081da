//! The Primitive Engine: registers and executes the five primitives
//! (spec §4.F).
//!
//! Grounded on the teacher's `Executor`: a stateless dispatcher holding
//! only references to the substrate, routing named calls to handler
//! functions rather than branching on an open-ended command enum.

use crate::context::CallContext;
use crate::request::{LinkRequest, RetrieveRequest, SearchRequest, StoreRequest, TransformRequest};
use crate::result::{
    LinkResult, RetrieveResult, SearchResultEntry, StoreIndexed, StoreResult, TransformResult,
};
use crate::stats::{PrimitiveStats, StatsSnapshot};
use crate::transform::TransformRegistry;
use agrama_core::{Error, Result};
use agrama_graph::GraphIndex;
use agrama_lexical::LexicalIndex;
use agrama_pool::ResultCache;
use agrama_query::{HybridQueryEngine, QueryOptions, ScoredResult};
use agrama_storage::StorageCore;
use agrama_vector::HnswIndex;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use std::time::Instant;

/// The five primitives the engine registers (spec §4.F: "The engine
/// registers exactly five primitives").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveName {
    Store,
    Retrieve,
    Search,
    Link,
    Transform,
}

impl PrimitiveName {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveName::Store => "store",
            PrimitiveName::Retrieve => "retrieve",
            PrimitiveName::Search => "search",
            PrimitiveName::Link => "link",
            PrimitiveName::Transform => "transform",
        }
    }

    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "store" => Ok(PrimitiveName::Store),
            "retrieve" => Ok(PrimitiveName::Retrieve),
            "search" => Ok(PrimitiveName::Search),
            "link" => Ok(PrimitiveName::Link),
            "transform" => Ok(PrimitiveName::Transform),
            other => Err(Error::UnknownOperation(other.to_string())),
        }
    }
}

pub struct PrimitiveEngine {
    storage: Arc<StorageCore>,
    lexical: Arc<LexicalIndex>,
    vector: Arc<HnswIndex>,
    graph: Arc<GraphIndex>,
    query: Arc<HybridQueryEngine>,
    transforms: TransformRegistry,
    result_cache: Arc<ResultCache<Vec<SearchResultEntry>>>,
    embedding_dimensions: usize,
    stats: FxHashMap<PrimitiveName, PrimitiveStats>,
}

impl PrimitiveEngine {
    pub fn new(
        storage: Arc<StorageCore>,
        lexical: Arc<LexicalIndex>,
        vector: Arc<HnswIndex>,
        graph: Arc<GraphIndex>,
        query: Arc<HybridQueryEngine>,
        result_cache: Arc<ResultCache<Vec<SearchResultEntry>>>,
        embedding_dimensions: usize,
    ) -> Self {
        let mut stats = FxHashMap::default();
        for name in [
            PrimitiveName::Store,
            PrimitiveName::Retrieve,
            PrimitiveName::Search,
            PrimitiveName::Link,
            PrimitiveName::Transform,
        ] {
            stats.insert(name, PrimitiveStats::new());
        }

        PrimitiveEngine {
            storage,
            lexical,
            vector,
            graph,
            query,
            transforms: TransformRegistry::with_builtins(),
            result_cache,
            embedding_dimensions,
            stats,
        }
    }

    pub fn stats_for(&self, name: PrimitiveName) -> StatsSnapshot {
        self.stats
            .get(&name)
            .map(PrimitiveStats::snapshot)
            .unwrap_or_default()
    }

    /// Snapshot of every primitive's call statistics, keyed by name. An
    /// in-process diagnostics surface (spec §4.F), not exposed over the
    /// JSON-RPC transport.
    pub fn stats(&self) -> FxHashMap<&'static str, StatsSnapshot> {
        self.stats
            .iter()
            .map(|(name, stats)| (name.as_str(), stats.snapshot()))
            .collect()
    }

    /// Dispatch a call by primitive name. *received → validated → executing
    /// → completed|failed* (spec §4.F "state machine per call"): validation
    /// happens in each handler before any mutation, and the elapsed-time
    /// measurement is recorded regardless of outcome.
    pub fn call(&self, name: &str, payload: serde_json::Value, ctx: &mut CallContext) -> Result<serde_json::Value> {
        let primitive = PrimitiveName::parse(name)?;
        if ctx.cancellation.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let started = Instant::now();
        let result = match primitive {
            PrimitiveName::Store => {
                let req: StoreRequest =
                    serde_json::from_value(payload).map_err(|e| Error::InvalidInput(e.to_string()))?;
                self.store(req, ctx).and_then(|r| serde_json::to_value(r).map_err(json_err))
            }
            PrimitiveName::Retrieve => {
                let req: RetrieveRequest =
                    serde_json::from_value(payload).map_err(|e| Error::InvalidInput(e.to_string()))?;
                self.retrieve(req).and_then(|r| serde_json::to_value(r).map_err(json_err))
            }
            PrimitiveName::Search => {
                let req: SearchRequest =
                    serde_json::from_value(payload).map_err(|e| Error::InvalidInput(e.to_string()))?;
                self.search(req, ctx).and_then(|r| serde_json::to_value(r).map_err(json_err))
            }
            PrimitiveName::Link => {
                let req: LinkRequest =
                    serde_json::from_value(payload).map_err(|e| Error::InvalidInput(e.to_string()))?;
                self.link(req, ctx).and_then(|r| serde_json::to_value(r).map_err(json_err))
            }
            PrimitiveName::Transform => {
                let req: TransformRequest =
                    serde_json::from_value(payload).map_err(|e| Error::InvalidInput(e.to_string()))?;
                self.transform(req).and_then(|r| serde_json::to_value(r).map_err(json_err))
            }
        };

        let elapsed_ns = started.elapsed().as_nanos() as u64;
        if let Some(stats) = self.stats.get(&primitive) {
            stats.record(elapsed_ns);
        }
        tracing::debug!(primitive = primitive.as_str(), elapsed_ns, ok = result.is_ok(), "primitive call");
        result
    }

    fn store(&self, req: StoreRequest, ctx: &CallContext) -> Result<StoreResult> {
        if let Some(embedding) = &req.embedding {
            if embedding.len() != self.embedding_dimensions {
                return Err(Error::DimensionMismatch {
                    expected: self.embedding_dimensions,
                    actual: embedding.len(),
                });
            }
        }

        let mut metadata = req.metadata.unwrap_or_default();
        metadata.insert("agent_id".into(), serde_json::Value::String(ctx.agent_id.clone()));
        metadata.insert("session_id".into(), serde_json::Value::String(ctx.session_id.clone()));
        metadata.insert("provenance".into(), serde_json::Value::String("store".into()));
        metadata.insert("timestamp".into(), serde_json::Value::Number(wall_clock_nanos().into()));

        let version = self.storage.put(
            &req.key,
            req.value.clone().into_bytes(),
            metadata.clone(),
            &ctx.agent_id,
            &ctx.session_id,
            req.embedding.clone(),
        )?;

        let doc_type = metadata
            .get("type")
            .and_then(|v| v.as_str())
            .unwrap_or("default")
            .to_string();
        self.lexical.index(&req.key, &req.value, &doc_type, version);

        let vector_indexed = if let Some(embedding) = req.embedding {
            self.vector.insert(&req.key, embedding)?;
            true
        } else {
            false
        };
        self.graph.register(&req.key);
        self.result_cache.invalidate_all();

        Ok(StoreResult {
            key: req.key,
            version,
            indexed: StoreIndexed {
                lexical: true,
                vector: vector_indexed,
            },
        })
    }

    fn retrieve(&self, req: RetrieveRequest) -> Result<RetrieveResult> {
        let item = match req.at_version {
            Some(v) => self.storage.get_at(&req.key, agrama_storage::VersionQuery::Version(v))?,
            None => self.storage.get(&req.key)?,
        };

        let history = if req.include_history {
            let items = self.storage.history(&req.key, req.history_limit.unwrap_or(10), None)?;
            Some(items.into_iter().map(crate::result::HistoryEntry::from).collect())
        } else {
            None
        };

        Ok(RetrieveResult {
            value: String::from_utf8_lossy(&item.value).into_owned(),
            metadata: item.metadata,
            version: item.version,
            created_at: item.created_at,
            history,
        })
    }

    fn search(&self, req: SearchRequest, _ctx: &CallContext) -> Result<Vec<SearchResultEntry>> {
        let mode_key = format!("{:?}", req.mode);
        let query_hash = agrama_pool::hash_query(&format!(
            "{:?}|{:?}|{:?}",
            req.query, req.query_embedding, req.options
        ));
        if let Some(cached) = self.result_cache.get(&mode_key, query_hash) {
            return Ok(cached);
        }

        let mode = req.mode.into();
        let options = QueryOptions {
            k: req.options.k,
            alpha: req.options.alpha,
            beta: req.options.beta,
            gamma: req.options.gamma,
            seeds: req.options.seeds,
            threshold: req.options.threshold,
        };

        let results: Vec<ScoredResult> = self
            .query
            .query(mode, req.query.as_deref(), req.query_embedding.as_deref(), &options)?;
        let entries: Vec<SearchResultEntry> = results.into_iter().map(SearchResultEntry::from).collect();
        self.result_cache.put(&mode_key, query_hash, entries.clone());
        Ok(entries)
    }

    fn link(&self, req: LinkRequest, ctx: &CallContext) -> Result<LinkResult> {
        if !self.storage.contains(&req.source) {
            return Err(Error::UnknownKey(req.source));
        }
        if !self.storage.contains(&req.target) {
            return Err(Error::UnknownKey(req.target));
        }
        let created_at = self.storage.snapshot().as_of();
        let mut metadata = req.metadata.unwrap_or_default();
        metadata.insert("agent_id".into(), serde_json::Value::String(ctx.agent_id.clone()));
        metadata.insert("session_id".into(), serde_json::Value::String(ctx.session_id.clone()));

        self.graph
            .link(&req.source, &req.target, &req.relation, req.weight, metadata, created_at)?;
        self.result_cache.invalidate_all();

        Ok(LinkResult {
            source: req.source,
            target: req.target,
            relation: req.relation,
            created_at,
        })
    }

    fn transform(&self, req: TransformRequest) -> Result<TransformResult> {
        let started = Instant::now();
        let input = if req.operation == "merge_items" {
            self.resolve_merge_items_keys(&req.input)?
        } else {
            req.input.clone()
        };
        let output = self
            .transforms
            .invoke(&req.operation, &input, &req.parameters)
            .map_err(|e| match e {
                Error::UnknownOperation(op) => Error::UnknownOperation(op),
                Error::InvalidInput(msg) => Error::InvalidInput(msg),
                other => Error::OperationFailed(other.to_string()),
            })?;

        Ok(TransformResult {
            operation: req.operation,
            output,
            elapsed_ns: started.elapsed().as_nanos() as u64,
        })
    }

    /// `merge_items` takes an array of keys (spec §4.F); resolve each key's
    /// current value from the Storage Core before handing the array of
    /// values to the transform registry, which has no storage handle of
    /// its own.
    fn resolve_merge_items_keys(&self, input: &serde_json::Value) -> Result<serde_json::Value> {
        let keys = input
            .as_array()
            .ok_or_else(|| Error::InvalidInput("merge_items expects an array of keys".into()))?;
        let mut values = Vec::with_capacity(keys.len());
        for key in keys {
            let key = key
                .as_str()
                .ok_or_else(|| Error::InvalidInput("merge_items expects an array of keys".into()))?;
            let item = self.storage.get(key)?;
            values.push(serde_json::Value::String(String::from_utf8_lossy(&item.value).into_owned()));
        }
        Ok(serde_json::Value::Array(values))
    }
}

fn json_err(e: serde_json::Error) -> Error {
    Error::OperationFailed(e.to_string())
}

fn wall_clock_nanos() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
