//! Typed directed multigraph with forward/reverse adjacency (spec §4.D).

use agrama_core::{Error, Key, Metadata, Result};
use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};

/// One edge's payload, stored on both the forward and reverse adjacency
/// sides so traversal in either direction avoids a second lookup.
#[derive(Debug, Clone)]
struct EdgeRecord {
    other: Key,
    weight: f64,
    metadata: Metadata,
    created_at: u64,
}

#[derive(Default)]
struct Inner {
    registered: FxHashSet<Key>,
    // source -> relation -> edges to target
    forward: FxHashMap<Key, FxHashMap<String, Vec<EdgeRecord>>>,
    // target -> relation -> edges from source
    reverse: FxHashMap<Key, FxHashMap<String, Vec<EdgeRecord>>>,
}

/// Typed directed multigraph over Storage Core keys.
///
/// Edges carry a `relation` label and a weight; `link` upserts by
/// `(source, target, relation)` identity so re-linking the same triple
/// updates weight/metadata rather than creating a duplicate edge.
pub struct GraphIndex {
    inner: RwLock<Inner>,
}

impl GraphIndex {
    pub fn new() -> Self {
        GraphIndex {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Register a key with no edges (spec §4.F STORE effect).
    pub fn register(&self, key: &str) {
        self.inner.write().registered.insert(key.to_string());
    }

    /// Whether `key` has been registered (exists in the Storage Core).
    pub fn is_registered(&self, key: &str) -> bool {
        self.inner.read().registered.contains(key)
    }

    /// Upsert an edge. Both endpoints must already be registered.
    pub fn link(
        &self,
        source: &str,
        target: &str,
        relation: &str,
        weight: f64,
        metadata: Metadata,
        created_at: u64,
    ) -> Result<()> {
        let mut inner = self.inner.write();
        if !inner.registered.contains(source) {
            return Err(Error::UnknownKey(source.to_string()));
        }
        if !inner.registered.contains(target) {
            return Err(Error::UnknownKey(target.to_string()));
        }

        upsert_edge(
            inner
                .forward
                .entry(source.to_string())
                .or_default()
                .entry(relation.to_string())
                .or_default(),
            target,
            weight,
            metadata.clone(),
            created_at,
        );
        upsert_edge(
            inner
                .reverse
                .entry(target.to_string())
                .or_default()
                .entry(relation.to_string())
                .or_default(),
            source,
            weight,
            metadata,
            created_at,
        );
        Ok(())
    }

    /// Outgoing neighbors of `source`, optionally filtered to one relation,
    /// sorted by target key ascending for deterministic output.
    pub fn neighbors(&self, source: &str, relation: Option<&str>) -> Result<Vec<(Key, f64)>> {
        let inner = self.inner.read();
        if !inner.registered.contains(source) {
            return Err(Error::UnknownKey(source.to_string()));
        }
        let mut out = Vec::new();
        if let Some(by_relation) = inner.forward.get(source) {
            match relation {
                Some(r) => {
                    if let Some(edges) = by_relation.get(r) {
                        out.extend(edges.iter().map(|e| (e.other.clone(), e.weight)));
                    }
                }
                None => {
                    for edges in by_relation.values() {
                        out.extend(edges.iter().map(|e| (e.other.clone(), e.weight)));
                    }
                }
            }
        }
        out.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(out)
    }

    fn directed_neighbors(&self, inner: &Inner, key: &str, direction: crate::Direction) -> Vec<(Key, f64)> {
        let mut out = Vec::new();
        if matches!(direction, crate::Direction::Forward | crate::Direction::Bidirectional) {
            if let Some(by_relation) = inner.forward.get(key) {
                for edges in by_relation.values() {
                    out.extend(edges.iter().map(|e| (e.other.clone(), e.weight)));
                }
            }
        }
        if matches!(direction, crate::Direction::Reverse | crate::Direction::Bidirectional) {
            if let Some(by_relation) = inner.reverse.get(key) {
                for edges in by_relation.values() {
                    out.extend(edges.iter().map(|e| (e.other.clone(), e.weight)));
                }
            }
        }
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    /// Bounded multi-source shortest paths (spec §4.D: "BMSSP").
    ///
    /// Dijkstra relaxation capped by `max_hops` (edges from any source) and
    /// `max_frontier` (distinct keys ever inserted into the priority
    /// queue); when the frontier cap is hit the traversal returns the
    /// best distances found so far rather than failing.
    pub fn shortest_paths(
        &self,
        sources: &[Key],
        max_hops: usize,
        max_frontier: usize,
        direction: crate::Direction,
    ) -> Result<FxHashMap<Key, f64>> {
        use std::cmp::Reverse;
        use std::collections::BinaryHeap;

        let inner = self.inner.read();
        for source in sources {
            if !inner.registered.contains(source) {
                return Err(Error::UnknownKey(source.clone()));
            }
        }

        let mut dist: FxHashMap<Key, f64> = FxHashMap::default();
        let mut popped: FxHashSet<Key> = FxHashSet::default();
        let mut frontier: FxHashSet<Key> = FxHashSet::default();
        let mut heap: BinaryHeap<Reverse<HeapItem>> = BinaryHeap::new();

        for source in sources {
            if frontier.len() >= max_frontier && !frontier.contains(source) {
                continue;
            }
            frontier.insert(source.clone());
            dist.insert(source.clone(), 0.0);
            heap.push(Reverse(HeapItem {
                distance: 0.0,
                hops: 0,
                key: source.clone(),
            }));
        }

        while let Some(Reverse(current)) = heap.pop() {
            if popped.contains(&current.key) {
                continue;
            }
            popped.insert(current.key.clone());
            if current.hops >= max_hops {
                continue;
            }

            for (neighbor, weight) in self.directed_neighbors(&inner, &current.key, direction) {
                if popped.contains(&neighbor) {
                    continue;
                }
                let candidate = current.distance + weight;
                let improves = dist.get(&neighbor).map(|&d| candidate < d).unwrap_or(true);
                if !improves {
                    continue;
                }
                if !frontier.contains(&neighbor) {
                    if frontier.len() >= max_frontier {
                        continue;
                    }
                    frontier.insert(neighbor.clone());
                }
                dist.insert(neighbor.clone(), candidate);
                heap.push(Reverse(HeapItem {
                    distance: candidate,
                    hops: current.hops + 1,
                    key: neighbor,
                }));
            }
        }

        Ok(dist)
    }
}

impl Default for GraphIndex {
    fn default() -> Self {
        Self::new()
    }
}

fn upsert_edge(edges: &mut Vec<EdgeRecord>, other: &str, weight: f64, metadata: Metadata, created_at: u64) {
    if let Some(existing) = edges.iter_mut().find(|e| e.other == other) {
        existing.weight = weight;
        existing.metadata = metadata;
        existing.created_at = created_at;
    } else {
        edges.push(EdgeRecord {
            other: other.to_string(),
            weight,
            metadata,
            created_at,
        });
    }
}

/// Priority queue entry: smaller distance first, ties by smaller key
/// (spec §4.D: "Ties by smaller `target` key").
#[derive(Debug, Clone, PartialEq)]
struct HeapItem {
    distance: f64,
    hops: usize,
    key: Key,
}

impl Eq for HeapItem {}
impl PartialOrd for HeapItem {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for HeapItem {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.distance
            .partial_cmp(&other.distance)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| self.key.cmp(&other.key))
    }
}
