//! Per-request and per-call arenas (spec §4.F, §4.H).
//!
//! Every dispatched request gets one `Arena`; every primitive call inside
//! it gets a sub-arena via [`Arena::sub_arena`]. Buffers checked out of an
//! arena are returned to the backing pool when the arena drops, so nothing
//! it handed out survives past the request.

use crate::pool::ObjectPool;
use std::sync::Arc;

/// A scratch-buffer allocator scoped to one request or primitive call.
pub struct Arena {
    pool: Arc<ObjectPool<Vec<u8>>>,
    checked_out: Vec<Vec<u8>>,
}

impl Arena {
    pub fn new(pool: Arc<ObjectPool<Vec<u8>>>) -> Self {
        Arena {
            pool,
            checked_out: Vec::new(),
        }
    }

    /// Check out a scratch buffer scoped to this arena.
    pub fn alloc_buffer(&mut self) -> &mut Vec<u8> {
        let buf = self.pool.acquire();
        self.checked_out.push(buf);
        self.checked_out.last_mut().expect("just pushed")
    }

    /// A child arena for a nested primitive call, drawing from the same
    /// backing pool as its parent.
    pub fn sub_arena(&self) -> Arena {
        Arena::new(self.pool.clone())
    }

    /// How many buffers this arena currently holds (tests/diagnostics).
    pub fn len(&self) -> usize {
        self.checked_out.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checked_out.is_empty()
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        for buf in self.checked_out.drain(..) {
            self.pool.release(buf);
        }
    }
}
