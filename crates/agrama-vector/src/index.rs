//! HNSW (Hierarchical Navigable Small World) vector index (spec §4.C).
//!
//! Incremental, deterministic (seedable RNG), built from scratch rather
//! than wrapping a third-party ANN library — the teacher's own HNSW
//! backend (`engine::primitives::vector::hnsw`) takes the same approach,
//! for the same reason: determinism under test is easier to guarantee when
//! you own the beam search.

use crate::config::HnswConfig;
use crate::distance::cosine_similarity;
use agrama_core::{Error, Key, Result};
use parking_lot::RwLock;
use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

/// A single HNSW graph node: its per-layer neighbor lists.
struct Node {
    /// `neighbors[layer]` = the set of neighbor keys at that layer.
    neighbors: Vec<BTreeSet<Key>>,
}

impl Node {
    fn new(top_layer: usize) -> Self {
        Node {
            neighbors: (0..=top_layer).map(|_| BTreeSet::new()).collect(),
        }
    }
}

struct Inner {
    nodes: BTreeMap<Key, Node>,
    embeddings: BTreeMap<Key, Vec<f32>>,
    entry_point: Option<Key>,
    max_level: usize,
    rng_counter: u64,
}

/// Candidate scored by similarity to a query vector; higher score = closer.
/// Ties break on `key` ascending, matching the graph's deterministic
/// iteration order.
#[derive(Debug, Clone)]
struct Scored {
    score: f32,
    key: Key,
}

impl PartialEq for Scored {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score && self.key == other.key
    }
}
impl Eq for Scored {}
impl PartialOrd for Scored {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Scored {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .partial_cmp(&other.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.key.cmp(&self.key))
    }
}

/// HNSW approximate nearest-neighbor index over fixed-dimension embeddings.
pub struct HnswIndex {
    config: HnswConfig,
    inner: RwLock<Inner>,
}

impl HnswIndex {
    /// Create an empty index for `config.dimension`-dimensional vectors.
    pub fn new(config: HnswConfig) -> Self {
        HnswIndex {
            config,
            inner: RwLock::new(Inner {
                nodes: BTreeMap::new(),
                embeddings: BTreeMap::new(),
                entry_point: None,
                max_level: 0,
                rng_counter: 0,
            }),
        }
    }

    /// Runtime-configurable search beam width.
    pub fn ef_search(&self) -> usize {
        self.config.ef_search
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.config.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.config.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }

    /// SplitMix64-based deterministic PRNG, seeded at construction and
    /// advanced by a monotonic counter so repeated inserts with the same
    /// seed produce the same layer assignment (spec §4.C: "seedable ...
    /// for reproducibility in tests").
    fn next_uniform(&self, inner: &mut Inner) -> f64 {
        inner.rng_counter += 1;
        let mut x = self.config.seed.wrapping_add(inner.rng_counter);
        x = (x ^ (x >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
        x = (x ^ (x >> 27)).wrapping_mul(0x94d049bb133111eb);
        x ^= x >> 31;
        ((x as f64) / (u64::MAX as f64)).max(1e-15)
    }

    /// `level = floor(-ln(uniform(0,1)) * 1/ln(M))` (spec §4.C).
    fn assign_level(&self, inner: &mut Inner) -> usize {
        let uniform = self.next_uniform(inner);
        (-uniform.ln() * self.config.level_multiplier()).floor() as usize
    }

    /// Insert `key` with embedding `vector`, building/updating the graph.
    pub fn insert(&self, key: &str, vector: Vec<f32>) -> Result<()> {
        self.check_dimension(&vector)?;
        let mut inner = self.inner.write();
        let level = self.assign_level(&mut inner);

        // Re-insertion: drop the old node's edges first so neighbor lists
        // never reference a stale version of this key's vector.
        if inner.nodes.contains_key(key) {
            self.remove_locked(&mut inner, key);
        }

        let Some(entry) = inner.entry_point.clone() else {
            inner.nodes.insert(key.to_string(), Node::new(level));
            inner.embeddings.insert(key.to_string(), vector);
            inner.entry_point = Some(key.to_string());
            inner.max_level = level;
            return Ok(());
        };

        let top = inner.max_level;
        let mut current = entry;

        // Greedy (ef=1) descent down to one layer above the new node's top.
        for layer in (level + 1..=top).rev() {
            current = self.greedy_closest(&inner, &vector, &current, layer);
        }

        let mut new_node = Node::new(level);
        for layer in (0..=level.min(top)).rev() {
            let candidates = self.search_layer(&inner, &vector, &current, self.config.ef_construction, layer);
            if let Some(best) = candidates.first() {
                current = best.key.clone();
            }
            let cap = if layer == 0 { self.config.m0 } else { self.config.m };
            let selected = self.select_neighbors_heuristic(&inner, &candidates, &vector, cap);

            new_node.neighbors[layer] = selected.iter().cloned().collect();
            for neighbor in &selected {
                self.connect_reciprocal(&mut inner, neighbor, key, layer, cap);
            }
        }

        inner.nodes.insert(key.to_string(), new_node);
        inner.embeddings.insert(key.to_string(), vector);

        if level > top {
            inner.entry_point = Some(key.to_string());
            inner.max_level = level;
        }

        Ok(())
    }

    /// Remove `key` from the graph (used by re-insertion; not exposed as a
    /// primitive-level delete, per spec §9's open question on deletion).
    fn remove_locked(&self, inner: &mut Inner, key: &str) {
        if let Some(node) = inner.nodes.remove(key) {
            for (layer, neighbors) in node.neighbors.iter().enumerate() {
                for neighbor in neighbors {
                    if let Some(n) = inner.nodes.get_mut(neighbor) {
                        if layer < n.neighbors.len() {
                            n.neighbors[layer].remove(key);
                        }
                    }
                }
            }
        }
        inner.embeddings.remove(key);
    }

    /// Add `key` as a neighbor of `of`, pruning `of`'s list back to `cap`
    /// using the diversity heuristic if it overflows (spec §3 invariant 4:
    /// "reciprocal-insertion policy ... both sides store each other up to
    /// cap, with pruning by distance").
    fn connect_reciprocal(&self, inner: &mut Inner, of: &str, key: &str, layer: usize, cap: usize) {
        let Some(of_vec) = inner.embeddings.get(of).cloned() else {
            return;
        };
        let node = match inner.nodes.get_mut(of) {
            Some(n) if layer < n.neighbors.len() => n,
            _ => return,
        };
        node.neighbors[layer].insert(key.to_string());
        if node.neighbors[layer].len() <= cap {
            return;
        }

        let candidates: Vec<Scored> = node.neighbors[layer]
            .iter()
            .filter_map(|k| {
                inner
                    .embeddings
                    .get(k)
                    .map(|v| Scored {
                        score: cosine_similarity(&of_vec, v),
                        key: k.clone(),
                    })
            })
            .collect();
        let mut sorted = candidates;
        sorted.sort_by(|a, b| b.cmp(a));
        let pruned = self.select_neighbors_heuristic_scored(&inner.embeddings, &sorted, &of_vec, cap);

        if let Some(n) = inner.nodes.get_mut(of) {
            n.neighbors[layer] = pruned.into_iter().collect();
        }
    }

    /// Beam search at a single layer (spec §4.C step 2/3): returns up to
    /// `ef` closest nodes to `query`, sorted by score desc then key asc.
    fn search_layer(&self, inner: &Inner, query: &[f32], entry: &str, ef: usize, layer: usize) -> Vec<Scored> {
        let Some(entry_vec) = inner.embeddings.get(entry) else {
            return Vec::new();
        };
        let entry_score = cosine_similarity(query, entry_vec);

        let mut visited: BTreeSet<Key> = BTreeSet::new();
        visited.insert(entry.to_string());

        let mut candidates: BinaryHeap<Scored> = BinaryHeap::new();
        candidates.push(Scored {
            score: entry_score,
            key: entry.to_string(),
        });

        let mut results: BinaryHeap<Reverse<Scored>> = BinaryHeap::new();
        results.push(Reverse(Scored {
            score: entry_score,
            key: entry.to_string(),
        }));

        while let Some(nearest) = candidates.pop() {
            let worst = results.peek().map(|r| r.0.score).unwrap_or(f32::NEG_INFINITY);
            if nearest.score < worst && results.len() >= ef {
                break;
            }
            let Some(node) = inner.nodes.get(&nearest.key) else {
                continue;
            };
            if layer >= node.neighbors.len() {
                continue;
            }
            for neighbor in &node.neighbors[layer] {
                if visited.contains(neighbor) {
                    continue;
                }
                visited.insert(neighbor.clone());
                let Some(n_vec) = inner.embeddings.get(neighbor) else {
                    continue;
                };
                let score = cosine_similarity(query, n_vec);
                let worst = results.peek().map(|r| r.0.score).unwrap_or(f32::NEG_INFINITY);
                if results.len() < ef || score > worst {
                    candidates.push(Scored {
                        score,
                        key: neighbor.clone(),
                    });
                    results.push(Reverse(Scored {
                        score,
                        key: neighbor.clone(),
                    }));
                    if results.len() > ef {
                        results.pop();
                    }
                }
            }
        }

        let mut out: Vec<Scored> = results.into_iter().map(|r| r.0).collect();
        out.sort_by(|a, b| b.cmp(a));
        out
    }

    /// Width-1 greedy descent (spec §4.C: "greedily descend ... using
    /// beam search of width ef_construction" above the target layer is
    /// implemented here as the degenerate ef=1 case used to find a good
    /// entry point for the next layer down).
    fn greedy_closest(&self, inner: &Inner, query: &[f32], entry: &str, layer: usize) -> Key {
        let mut current = entry.to_string();
        loop {
            let Some(cur_vec) = inner.embeddings.get(&current) else {
                return current;
            };
            let mut best_score = cosine_similarity(query, cur_vec);
            let mut best = current.clone();

            if let Some(node) = inner.nodes.get(&current) {
                if layer < node.neighbors.len() {
                    for neighbor in &node.neighbors[layer] {
                        if let Some(n_vec) = inner.embeddings.get(neighbor) {
                            let score = cosine_similarity(query, n_vec);
                            if score > best_score || (score == best_score && *neighbor < best) {
                                best_score = score;
                                best = neighbor.clone();
                            }
                        }
                    }
                }
            }

            if best == current {
                return current;
            }
            current = best;
        }
    }

    /// Diversity-preserving pruning (spec §4.C step 3): keep candidate `c`
    /// only if no already-kept neighbor is strictly closer to `c` than `c`
    /// is to the new node.
    fn select_neighbors_heuristic(&self, inner: &Inner, candidates: &[Scored], query: &[f32], cap: usize) -> Vec<Key> {
        self.select_neighbors_heuristic_scored(&inner.embeddings, candidates, query, cap)
    }

    fn select_neighbors_heuristic_scored(
        &self,
        embeddings: &BTreeMap<Key, Vec<f32>>,
        candidates: &[Scored],
        query: &[f32],
        cap: usize,
    ) -> Vec<Key> {
        let mut kept: Vec<Scored> = Vec::new();
        for candidate in candidates {
            if kept.len() >= cap {
                break;
            }
            let Some(c_vec) = embeddings.get(&candidate.key) else {
                continue;
            };
            let dist_to_query = 1.0 - candidate.score;
            let dominated = kept.iter().any(|k| {
                embeddings
                    .get(&k.key)
                    .map(|k_vec| (1.0 - cosine_similarity(k_vec, c_vec)) < dist_to_query)
                    .unwrap_or(false)
            });
            if !dominated {
                kept.push(candidate.clone());
            }
        }
        // Diversity pruning can leave the cap unfilled; top up with the
        // remaining closest candidates so connectivity doesn't starve.
        if kept.len() < cap {
            for candidate in candidates {
                if kept.len() >= cap {
                    break;
                }
                if !kept.iter().any(|k| k.key == candidate.key) {
                    kept.push(candidate.clone());
                }
            }
        }
        kept.into_iter().map(|s| s.key).collect()
    }

    /// Top-`k` nearest neighbors to `query` by cosine distance.
    ///
    /// Returns an empty sequence (not an error) on an empty index.
    pub fn search(&self, query: &[f32], k: usize, ef: usize) -> Result<Vec<(Key, f32)>> {
        self.check_dimension(query)?;
        let inner = self.inner.read();
        let Some(entry) = inner.entry_point.clone() else {
            return Ok(Vec::new());
        };
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut current = entry;
        for layer in (1..=inner.max_level).rev() {
            current = self.greedy_closest(&inner, query, &current, layer);
        }

        let ef = ef.max(1);
        let candidates = self.search_layer(&inner, query, &current, ef, 0);
        Ok(candidates
            .into_iter()
            .take(k)
            .map(|s| (s.key, 1.0 - s.score))
            .collect())
    }

    /// Number of indexed keys.
    pub fn len(&self) -> usize {
        self.inner.read().nodes.len()
    }

    /// Whether the index has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(dim: usize) -> HnswIndex {
        HnswIndex::new(HnswConfig::new(dim, 42))
    }

    #[test]
    fn search_on_empty_index_returns_empty() {
        let idx = index(4);
        assert!(idx.search(&[1.0, 0.0, 0.0, 0.0], 5, 50).unwrap().is_empty());
    }

    #[test]
    fn dimension_mismatch_on_insert() {
        let idx = index(4);
        let err = idx.insert("a", vec![1.0, 0.0]).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { .. }));
    }

    #[test]
    fn dimension_mismatch_on_search() {
        let idx = index(4);
        idx.insert("a", vec![1.0, 0.0, 0.0, 0.0]).unwrap();
        let err = idx.search(&[1.0, 0.0], 1, 50).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { .. }));
    }

    #[test]
    fn exact_match_is_top_result() {
        let idx = index(4);
        idx.insert("a", vec![1.0, 0.0, 0.0, 0.0]).unwrap();
        idx.insert("b", vec![0.9, 0.1, 0.0, 0.0]).unwrap();
        idx.insert("c", vec![0.0, 0.0, 1.0, 0.0]).unwrap();

        let results = idx.search(&[1.0, 0.0, 0.0, 0.0], 1, 50).unwrap();
        assert_eq!(results[0].0, "a");
    }

    #[test]
    fn neighbor_lists_only_reference_indexed_keys() {
        let idx = index(4);
        for i in 0..20 {
            let mut v = vec![0.0f32; 4];
            v[i % 4] = 1.0 + i as f32 * 0.01;
            idx.insert(&format!("k{i}"), v).unwrap();
        }
        let inner = idx.inner.read();
        for node in inner.nodes.values() {
            for layer in &node.neighbors {
                for neighbor in layer {
                    assert!(inner.nodes.contains_key(neighbor));
                }
            }
        }
    }

    #[test]
    fn recall_on_random_high_dimensional_vectors() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let dim = 64;
        let idx = index(dim);
        let mut rng = StdRng::seed_from_u64(7);

        let mut vectors = Vec::new();
        for i in 0..200 {
            let mut v: Vec<f32> = (0..dim).map(|_| rng.gen_range(-1.0..1.0)).collect();
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            for x in &mut v {
                *x /= norm;
            }
            idx.insert(&format!("v{i}"), v.clone()).unwrap();
            vectors.push(v);
        }

        let mut hits = 0;
        let trials = 30;
        for t in 0..trials {
            let query = &vectors[t * 5 % vectors.len()];
            let mut brute: Vec<(usize, f32)> = vectors
                .iter()
                .enumerate()
                .map(|(i, v)| (i, cosine_similarity(query, v)))
                .collect();
            brute.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
            let expected = format!("v{}", brute[0].0);

            let results = idx.search(query, 1, 100).unwrap();
            if results[0].0 == expected {
                hits += 1;
            }
        }
        // Recall test per spec §8.4; ef >= k and d >= 64.
        assert!(hits as f64 / trials as f64 >= 0.8);
    }
}
