//! Per-call context: identity, cancellation, and the call's arena
//! (spec §4.F "per-call discipline", §5 "cancellation").

use agrama_pool::Arena;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A flag checked at entry, after validation, and inside long-running
/// loops (HNSW beam search layers, BMSSP iterations). Cheap to clone and
/// share with whatever dispatched the call.
#[derive(Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Identity and resources threaded through one primitive call.
pub struct CallContext {
    pub agent_id: String,
    pub session_id: String,
    pub cancellation: CancellationToken,
    pub arena: Arena,
}

impl CallContext {
    pub fn new(agent_id: String, session_id: String, cancellation: CancellationToken, arena: Arena) -> Self {
        CallContext {
            agent_id,
            session_id,
            cancellation,
            arena,
        }
    }
}
