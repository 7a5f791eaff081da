//! Fixed-size object pools (spec §4.H).
//!
//! Mirrors the teacher's `TransactionPool`: reuse previously-allocated
//! collections instead of paying for a fresh allocation on every call.
//! Unlike the teacher's thread-local pool, Agrama's worker pool hands a
//! request to whichever OS thread is free, so pools here are shared and
//! guarded by a lock rather than keyed off the current thread.

use parking_lot::Mutex;

/// Something that can be reset to an empty-but-allocated state for reuse.
pub trait Resettable {
    fn reset(&mut self);
}

impl<T> Resettable for Vec<T> {
    fn reset(&mut self) {
        self.clear();
    }
}

/// A capacity-bounded pool of reusable `T`s.
///
/// `acquire` returns a pooled value if one is available, otherwise builds
/// a fresh one via `Default`. `release` returns a value to the pool if
/// there's room; past capacity it's simply dropped (spec §4.H: "on
/// exhaustion, falls back to direct allocation").
pub struct ObjectPool<T: Default + Resettable> {
    items: Mutex<Vec<T>>,
    capacity: usize,
}

impl<T: Default + Resettable> ObjectPool<T> {
    pub fn new(capacity: usize) -> Self {
        ObjectPool {
            items: Mutex::new(Vec::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn acquire(&self) -> T {
        self.items.lock().pop().unwrap_or_default()
    }

    pub fn release(&self, mut item: T) {
        item.reset();
        let mut items = self.items.lock();
        if items.len() < self.capacity {
            items.push(item);
        }
    }

    /// Number of items currently held in the pool (for tests/diagnostics).
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
