//! # Agrama
//!
//! A temporal knowledge-graph database for AI coding agents: five
//! primitives (STORE, RETRIEVE, SEARCH, LINK, TRANSFORM) over a
//! versioned, append-only record store, exposed through a line-delimited
//! JSON-RPC dispatcher over stdio.
//!
//! This crate re-exports the public surface of the underlying `agrama-*`
//! crates so a single dependency gets you storage, indexing, the
//! primitive engine, and the dispatcher. The `agrama` binary (see
//! `crates/agrama-cli`) is a thin `serve` wrapper over the same types.
//!
//! # Quick Start
//!
//! ```no_run
//! use agrama::{
//!     GraphIndex, HnswConfig, HnswIndex, HybridQueryEngine, LexicalIndex, Limits,
//!     PrimitiveEngine, ResultCache, StorageCore,
//! };
//! use std::sync::Arc;
//!
//! fn main() -> agrama::Result<()> {
//!     let storage = Arc::new(StorageCore::open("./data/log")?.with_limits(Limits::default()));
//!     let lexical = Arc::new(LexicalIndex::new());
//!     let vector = Arc::new(HnswIndex::new(HnswConfig::new(768, 0)));
//!     let graph = Arc::new(GraphIndex::new());
//!     let query = Arc::new(HybridQueryEngine::new(
//!         storage.clone(),
//!         lexical.clone(),
//!         vector.clone(),
//!         graph.clone(),
//!     ));
//!     let cache = Arc::new(ResultCache::new(1024));
//!     let _engine = PrimitiveEngine::new(storage, lexical, vector, graph, query, cache, 768);
//!     Ok(())
//! }
//! ```
//!
//! Internal crates (`agrama-core`, `agrama-storage`, ...) are workspace
//! members, not meant to be depended on directly outside this workspace;
//! this crate is the stable surface.

pub use agrama_core::{Edge, Error, Item, Key, Limits, Metadata, Result};
pub use agrama_dispatcher::{Dispatcher, DispatcherConfig, ExitReason};
pub use agrama_graph::{Direction, GraphIndex};
pub use agrama_lexical::LexicalIndex;
pub use agrama_pool::{hash_query, Arena, ObjectPool, ResultCache};
pub use agrama_primitives::{CallContext, CancellationToken, PrimitiveEngine, PrimitiveName, StatsSnapshot};
pub use agrama_query::{ComponentScores, HybridQueryEngine, QueryMode, QueryOptions, ScoredResult};
pub use agrama_storage::{StorageCore, VersionQuery};
pub use agrama_vector::{cosine_distance, cosine_similarity, HnswConfig, HnswIndex};
