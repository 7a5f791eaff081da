//! Inverted index with BM25 scoring (spec §4.B).

use crate::tokenizer::tokenize;
use agrama_core::Key;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

const K1: f32 = 1.2;
const B: f32 = 0.75;

/// Per-term, per-document posting.
#[derive(Debug, Clone)]
struct Posting {
    term_frequency: u32,
    /// Version of the document at the time it was indexed; retained so a
    /// rebuild can detect staleness, though this index never re-derives it.
    #[allow(dead_code)]
    version_at_index: u64,
}

#[derive(Debug, Clone)]
struct DocMeta {
    length: u32,
    created_at: u64,
    field_weight: f32,
    /// Terms this document currently contributes postings for, so a
    /// re-index or removal can retract exactly its own contribution.
    terms: Vec<String>,
    /// Lazily marks a document removed; its postings are pruned on the next
    /// compaction rather than immediately (spec §4.B: "remove — lazy").
    removed: bool,
}

/// Field weight for a document type, applied to every term contribution
/// from that document (spec §4.B).
fn field_weight_for(doc_type: &str) -> f32 {
    match doc_type {
        "function" => 3.0,
        "type" | "struct" => 2.5,
        "variable" => 2.0,
        "comment" => 1.0,
        _ => 1.0,
    }
}

/// BM25 inverted index, code-aware via [`tokenize`].
pub struct LexicalIndex {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    postings: FxHashMap<String, FxHashMap<Key, Posting>>,
    docs: FxHashMap<Key, DocMeta>,
    total_length: u64,
}

impl Default for LexicalIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl LexicalIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        LexicalIndex {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Tokenize and index `text` under `key`, inferring a field weight from
    /// `doc_type` (e.g. `"function"`, `"type"`, `"variable"`, `"comment"`).
    pub fn index(&self, key: &str, text: &str, doc_type: &str, created_at: u64) {
        let tokens = tokenize(text);
        let mut inner = self.inner.write();

        // Re-indexing an existing key: retract exactly its previous
        // postings so doc_freqs / total_length stay accurate.
        if let Some(old) = inner.docs.remove(key) {
            if !old.removed {
                inner.total_length = inner.total_length.saturating_sub(old.length as u64);
            }
            for term in &old.terms {
                if let Some(postings) = inner.postings.get_mut(term) {
                    postings.remove(key);
                }
            }
        }

        let mut term_counts: FxHashMap<String, u32> = FxHashMap::default();
        for token in &tokens {
            *term_counts.entry(token.clone()).or_insert(0) += 1;
        }

        let terms: Vec<String> = term_counts.keys().cloned().collect();
        for (term, tf) in term_counts {
            inner
                .postings
                .entry(term)
                .or_default()
                .insert(
                    key.to_string(),
                    Posting {
                        term_frequency: tf,
                        version_at_index: created_at,
                    },
                );
        }

        let length = tokens.len() as u32;
        inner.total_length += length as u64;
        inner.docs.insert(
            key.to_string(),
            DocMeta {
                length,
                created_at,
                field_weight: field_weight_for(doc_type),
                terms,
                removed: false,
            },
        );
    }

    /// Lazily mark `key` removed. Its postings are skipped during search
    /// and pruned on the next explicit compaction.
    pub fn remove(&self, key: &str) {
        let mut inner = self.inner.write();
        self.remove_locked(&mut inner, key);
    }

    fn remove_locked(&self, inner: &mut Inner, key: &str) {
        if let Some(meta) = inner.docs.get_mut(key) {
            if !meta.removed {
                inner.total_length = inner.total_length.saturating_sub(meta.length as u64);
            }
            meta.removed = true;
        }
    }

    /// Compact away postings belonging to removed documents.
    pub fn compact(&self) {
        let mut inner = self.inner.write();
        let removed_keys: Vec<Key> = inner
            .docs
            .iter()
            .filter(|(_, m)| m.removed)
            .map(|(k, _)| k.clone())
            .collect();
        for key in &removed_keys {
            inner.docs.remove(key);
        }
        for postings in inner.postings.values_mut() {
            for key in &removed_keys {
                postings.remove(key);
            }
        }
        inner.postings.retain(|_, postings| !postings.is_empty());
    }

    /// Document frequency for `term`: the number of distinct non-removed
    /// keys with a posting for it (spec §3 invariant 3).
    pub fn doc_frequency(&self, term: &str) -> usize {
        let inner = self.inner.read();
        inner
            .postings
            .get(term)
            .map(|m| {
                m.keys()
                    .filter(|k| inner.docs.get(*k).map_or(false, |d| !d.removed))
                    .count()
            })
            .unwrap_or(0)
    }

    /// Top-`k` BM25 matches for `query`.
    pub fn search(&self, query: &str, k: usize) -> Vec<(Key, f32)> {
        if k == 0 {
            return Vec::new();
        }
        let terms = tokenize(query);
        if terms.is_empty() {
            return Vec::new();
        }

        let inner = self.inner.read();
        let total_docs = inner.docs.values().filter(|d| !d.removed).count();
        if total_docs == 0 {
            return Vec::new();
        }
        let avg_len = (inner.total_length as f32 / total_docs as f32).max(1.0);

        let mut scores: FxHashMap<Key, f32> = FxHashMap::default();
        for term in &terms {
            let Some(postings) = inner.postings.get(term) else {
                continue;
            };
            let df = postings
                .keys()
                .filter(|k| inner.docs.get(*k).map_or(false, |d| !d.removed))
                .count();
            if df == 0 {
                continue;
            }
            let idf = (((total_docs as f32 - df as f32 + 0.5) / (df as f32 + 0.5)) + 1.0).ln();

            for (key, posting) in postings {
                let Some(meta) = inner.docs.get(key) else {
                    continue;
                };
                if meta.removed {
                    continue;
                }
                let tf = posting.term_frequency as f32;
                let norm = tf * (K1 + 1.0)
                    / (tf + K1 * (1.0 - B + B * meta.length as f32 / avg_len));
                *scores.entry(key.clone()).or_insert(0.0) += idf * norm * meta.field_weight;
            }
        }

        let mut heap: BinaryHeap<ScoredKey> = BinaryHeap::new();
        for (key, score) in scores {
            let created_at = inner.docs.get(&key).map(|d| d.created_at).unwrap_or(0);
            heap.push(ScoredKey {
                score,
                created_at,
                key,
            });
        }

        let mut results: Vec<(Key, f32)> = Vec::with_capacity(k.min(heap.len()));
        for _ in 0..k {
            match heap.pop() {
                Some(sk) => results.push((sk.key, sk.score)),
                None => break,
            }
        }
        results
    }
}

/// Max-heap ordering with the spec's tie-break: higher score first, then
/// more recent `created_at`, then lexicographically smaller key.
struct ScoredKey {
    score: f32,
    created_at: u64,
    key: Key,
}

impl PartialEq for ScoredKey {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score && self.created_at == other.created_at && self.key == other.key
    }
}
impl Eq for ScoredKey {}

impl PartialOrd for ScoredKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScoredKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .partial_cmp(&other.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.created_at.cmp(&other.created_at))
            .then_with(|| other.key.cmp(&self.key))
    }
}
