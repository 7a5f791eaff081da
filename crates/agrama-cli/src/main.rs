//! `agrama serve`: resolves configuration, wires up the storage and index
//! substrate, and runs the JSON-RPC stdio dispatcher until EOF or a fatal
//! error (spec §4.I, §6).

mod config;
mod meta;

use agrama_core::Limits;
use agrama_dispatcher::{Dispatcher, DispatcherConfig, ExitReason};
use agrama_graph::GraphIndex;
use agrama_lexical::LexicalIndex;
use agrama_pool::ResultCache;
use agrama_primitives::PrimitiveEngine;
use agrama_query::HybridQueryEngine;
use agrama_storage::StorageCore;
use agrama_vector::{HnswConfig, HnswIndex};
use config::AgramaConfig;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.split_first() {
        Some((subcommand, rest)) if subcommand == "serve" => match serve(rest) {
            Ok(code) => ExitCode::from(code),
            Err(message) => {
                eprintln!("agrama: {message}");
                ExitCode::from(1)
            }
        },
        Some((other, _)) => {
            eprintln!("agrama: unknown subcommand '{other}', expected 'serve'");
            ExitCode::from(1)
        }
        None => {
            eprintln!("usage: agrama serve [--log-path PATH] [--embedding-dimensions N] [--max-concurrency N] [--hnsw-seed N]");
            ExitCode::from(1)
        }
    }
}

fn serve(args: &[String]) -> Result<u8, String> {
    let config = AgramaConfig::from_args(args)?;
    init_logging();

    meta::Meta::reconcile(&config.log_path, config.embedding_dimensions, config.hnsw_seed)?;

    let storage = Arc::new(
        StorageCore::open(config.log_path.join("log"))
            .map_err(|e| format!("failed to open log: {e}"))?
            .with_limits(Limits::default()),
    );
    let lexical = Arc::new(LexicalIndex::new());
    let vector = Arc::new(HnswIndex::new(HnswConfig::new(config.embedding_dimensions, config.hnsw_seed)));
    let graph = Arc::new(GraphIndex::new());
    let query = Arc::new(HybridQueryEngine::new(storage.clone(), lexical.clone(), vector.clone(), graph.clone()));
    let result_cache = Arc::new(ResultCache::new(config.result_cache_capacity));

    let engine = Arc::new(PrimitiveEngine::new(
        storage,
        lexical,
        vector,
        graph,
        query,
        result_cache,
        config.embedding_dimensions,
    ));

    let dispatcher = Dispatcher::new(
        engine,
        DispatcherConfig {
            worker_count: config.max_concurrency,
            queue_capacity: config.queue_capacity,
            call_timeout: config.call_timeout,
            max_line_bytes: 8 * 1024 * 1024,
        },
    );

    tracing::info!(
        log_path = %config.log_path.display(),
        embedding_dimensions = config.embedding_dimensions,
        max_concurrency = config.max_concurrency,
        "agrama dispatcher starting"
    );

    let stdin = std::io::stdin();
    match dispatcher.run(stdin.lock(), std::io::stdout()) {
        ExitReason::CleanShutdown => Ok(0),
        ExitReason::Fatal => Ok(2),
    }
}

fn init_logging() {
    let filter = EnvFilter::new(config::log_level_directive());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
