//! Hybrid Query Engine orchestrator (spec §4.E).
//!
//! Mirrors the teacher's `HybridSearch`: a thin, stateless-by-construction
//! orchestrator over the three index crates, fusing per-component scores
//! with a linear combination rather than re-implementing any of them.

use crate::types::{ComponentScores, QueryMode, QueryOptions, ScoredResult};
use agrama_core::{Error, Key, Result};
use agrama_graph::{Direction, GraphIndex};
use agrama_lexical::LexicalIndex;
use agrama_storage::StorageCore;
use agrama_vector::HnswIndex;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Candidates retained per component before fusion, as a multiple of `k`.
const CANDIDATE_MULTIPLIER: usize = 4;
const MAX_HOPS: usize = 3;
const MAX_FRONTIER: usize = 1024;

pub struct HybridQueryEngine {
    storage: Arc<StorageCore>,
    lexical: Arc<LexicalIndex>,
    vector: Arc<HnswIndex>,
    graph: Arc<GraphIndex>,
}

impl HybridQueryEngine {
    pub fn new(
        storage: Arc<StorageCore>,
        lexical: Arc<LexicalIndex>,
        vector: Arc<HnswIndex>,
        graph: Arc<GraphIndex>,
    ) -> Self {
        HybridQueryEngine {
            storage,
            lexical,
            vector,
            graph,
        }
    }

    /// Dispatch a SEARCH call to the component(s) named by `mode`.
    pub fn query(
        &self,
        mode: QueryMode,
        text: Option<&str>,
        embedding: Option<&[f32]>,
        options: &QueryOptions,
    ) -> Result<Vec<ScoredResult>> {
        match mode {
            QueryMode::Lexical => {
                let text = text.ok_or_else(|| Error::InvalidInput("lexical search requires query text".into()))?;
                self.search_lexical(text, options)
            }
            QueryMode::Semantic => {
                let embedding = embedding
                    .ok_or_else(|| Error::InvalidInput("semantic search requires query_embedding".into()))?;
                self.search_semantic(embedding, options)
            }
            QueryMode::Graph => self.search_graph(options),
            QueryMode::Hybrid => self.search_hybrid(text, embedding, options),
        }
    }

    fn search_lexical(&self, text: &str, options: &QueryOptions) -> Result<Vec<ScoredResult>> {
        let hits = self.lexical.search(text, options.k);
        Ok(self.apply_threshold(
            hits.into_iter()
                .map(|(key, score)| ScoredResult {
                    key,
                    score: score as f64,
                    component_scores: None,
                })
                .collect(),
            options,
        ))
    }

    fn search_semantic(&self, embedding: &[f32], options: &QueryOptions) -> Result<Vec<ScoredResult>> {
        let ef = self.vector.ef_search().max(options.k * CANDIDATE_MULTIPLIER);
        let hits = self.vector.search(embedding, options.k, ef)?;
        Ok(self.apply_threshold(
            hits.into_iter()
                .map(|(key, distance)| ScoredResult {
                    key,
                    score: (1.0 - distance as f64).clamp(0.0, 1.0),
                    component_scores: None,
                })
                .collect(),
            options,
        ))
    }

    fn search_graph(&self, options: &QueryOptions) -> Result<Vec<ScoredResult>> {
        if options.seeds.is_empty() {
            return Ok(Vec::new());
        }
        let dist = self
            .graph
            .shortest_paths(&options.seeds, MAX_HOPS, MAX_FRONTIER, Direction::Bidirectional)?;

        let mut results: Vec<ScoredResult> = dist
            .into_iter()
            .map(|(key, distance)| ScoredResult {
                key,
                score: (-distance).exp(),
                component_scores: None,
            })
            .collect();
        self.sort_by_score_then_recency(&mut results);
        results.truncate(options.k);
        Ok(self.apply_threshold(results, options))
    }

    fn search_hybrid(
        &self,
        text: Option<&str>,
        embedding: Option<&[f32]>,
        options: &QueryOptions,
    ) -> Result<Vec<ScoredResult>> {
        let candidate_k = options.k * CANDIDATE_MULTIPLIER;

        let lexical_map = match text {
            Some(text) => normalize(self.lexical.search(text, candidate_k)),
            None => FxHashMap::default(),
        };

        let vector_map = match embedding {
            Some(embedding) => {
                let ef = self.vector.ef_search().max(candidate_k).max(4 * options.k);
                let hits = self.vector.search(embedding, candidate_k, ef)?;
                hits.into_iter()
                    .map(|(key, distance)| (key, (1.0 - distance as f64).clamp(0.0, 1.0)))
                    .collect::<FxHashMap<Key, f64>>()
            }
            None => FxHashMap::default(),
        };

        let mut seeds: Vec<Key> = options.seeds.clone();
        seeds.extend(lexical_map.keys().cloned());
        seeds.extend(vector_map.keys().cloned());
        seeds.sort();
        seeds.dedup();
        seeds.retain(|key| self.graph.is_registered(key));

        let graph_map: FxHashMap<Key, f64> = if seeds.is_empty() {
            FxHashMap::default()
        } else {
            self.graph
                .shortest_paths(&seeds, MAX_HOPS, MAX_FRONTIER, Direction::Bidirectional)?
                .into_iter()
                .map(|(key, distance)| (key, (-distance).exp()))
                .collect()
        };

        let mut candidates: Vec<Key> = lexical_map.keys().cloned().collect();
        candidates.extend(vector_map.keys().cloned());
        candidates.extend(graph_map.keys().cloned());
        candidates.sort();
        candidates.dedup();

        let cap = (4 * options.k).max(256);
        if candidates.len() > cap {
            let mut scored: Vec<(Key, f64)> = candidates
                .into_iter()
                .map(|key| {
                    let best = lexical_map
                        .get(&key)
                        .copied()
                        .max(vector_map.get(&key).copied().unwrap_or(0.0))
                        .max(graph_map.get(&key).copied().unwrap_or(0.0));
                    (key, best)
                })
                .collect();
            scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
            scored.truncate(cap);
            candidates = scored.into_iter().map(|(key, _)| key).collect();
        }

        let mut results: Vec<ScoredResult> = candidates
            .into_iter()
            .map(|key| {
                let s_l = lexical_map.get(&key).copied().unwrap_or(0.0);
                let s_v = vector_map.get(&key).copied().unwrap_or(0.0);
                let s_g = graph_map.get(&key).copied().unwrap_or(0.0);
                ScoredResult {
                    key,
                    score: options.alpha * s_l + options.beta * s_v + options.gamma * s_g,
                    component_scores: Some(ComponentScores {
                        lexical: s_l,
                        vector: s_v,
                        graph: s_g,
                    }),
                }
            })
            .collect();

        self.sort_by_score_then_recency(&mut results);
        results.truncate(options.k);
        Ok(self.apply_threshold(results, options))
    }

    fn created_at(&self, key: &str) -> u64 {
        self.storage.get(key).map(|item| item.created_at).unwrap_or(0)
    }

    fn sort_by_score_then_recency(&self, results: &mut [ScoredResult]) {
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| self.created_at(&b.key).cmp(&self.created_at(&a.key)))
                .then_with(|| a.key.cmp(&b.key))
        });
    }

    fn apply_threshold(&self, results: Vec<ScoredResult>, options: &QueryOptions) -> Vec<ScoredResult> {
        match options.threshold {
            Some(threshold) => results.into_iter().filter(|r| r.score >= threshold).collect(),
            None => results,
        }
    }
}

/// Normalize raw scores to `[0, 1]` by dividing by the max observed score
/// in this call (spec §4.E step 1); empty input yields an empty map.
fn normalize(hits: Vec<(Key, f32)>) -> FxHashMap<Key, f64> {
    let max = hits.iter().map(|(_, s)| *s).fold(0.0f32, f32::max);
    if max <= 0.0 {
        return hits.into_iter().map(|(key, _)| (key, 0.0)).collect();
    }
    hits.into_iter().map(|(key, score)| (key, (score / max) as f64)).collect()
}
