//! Optional result cache (spec §4.H): `(mode, query_hash) -> search result`,
//! invalidated wholesale on any STORE or LINK mutation.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};

/// A fixed-capacity cache of search results keyed by `(mode, query_hash)`.
///
/// Eviction is FIFO once `capacity` is reached; this is a hit-rate
/// optimization, not a correctness mechanism, so a simple policy is
/// enough. Every STORE/LINK mutation calls [`ResultCache::invalidate_all`].
pub struct ResultCache<V: Clone> {
    capacity: usize,
    inner: Mutex<Inner<V>>,
}

struct Inner<V> {
    entries: FxHashMap<(String, u64), V>,
    order: VecDeque<(String, u64)>,
}

impl<V: Clone> ResultCache<V> {
    pub fn new(capacity: usize) -> Self {
        ResultCache {
            capacity,
            inner: Mutex::new(Inner {
                entries: FxHashMap::default(),
                order: VecDeque::new(),
            }),
        }
    }

    pub fn get(&self, mode: &str, query_hash: u64) -> Option<V> {
        self.inner.lock().entries.get(&(mode.to_string(), query_hash)).cloned()
    }

    pub fn put(&self, mode: &str, query_hash: u64, value: V) {
        if self.capacity == 0 {
            return;
        }
        let key = (mode.to_string(), query_hash);
        let mut inner = self.inner.lock();
        if inner.entries.insert(key.clone(), value).is_none() {
            inner.order.push_back(key);
            while inner.order.len() > self.capacity {
                if let Some(oldest) = inner.order.pop_front() {
                    inner.entries.remove(&oldest);
                }
            }
        }
    }

    /// Drop every cached entry (spec §4.H: "invalidated on any STORE or
    /// LINK mutation").
    pub fn invalidate_all(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.order.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Stable hash of a query's shape, suitable as the cache key's second
/// component (not cryptographic; collisions just cost a cache miss).
pub fn hash_query<T: Hash>(query: &T) -> u64 {
    let mut hasher = rustc_hash::FxHasher::default();
    query.hash(&mut hasher);
    hasher.finish()
}
