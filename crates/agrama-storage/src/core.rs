//! The Storage Core: per-key versioned value log (spec §4.A).

use crate::log::AppendLog;
use crate::snapshot::Snapshot;
use agrama_core::{Error, Item, Key, Limits, Metadata, Result};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Selector for [`StorageCore::get_at`]: an exact version, or the latest
/// version with `created_at <= timestamp`.
#[derive(Debug, Clone, Copy)]
pub enum VersionQuery {
    /// An exact 1-based version number.
    Version(u64),
    /// The latest version at or before this nanosecond timestamp.
    Timestamp(u64),
}

/// Single-writer, multi-reader temporal key-value store.
///
/// All writes serialize through `writer` (spec §4.A, §5: "all writes are
/// serialized through a single writer; reads proceed in parallel and are
/// linearizable relative to writes"). The per-key history lives in a
/// [`DashMap`] so concurrent readers of different keys never contend.
pub struct StorageCore {
    history: DashMap<Key, Vec<Item>>,
    writer: Mutex<WriterState>,
    limits: Limits,
    consecutive_write_failures: AtomicU64,
}

struct WriterState {
    log: AppendLog,
    next_created_at: u64,
}

impl StorageCore {
    /// Open (or create) a store backed by a single append-only log file.
    pub fn open(log_path: impl AsRef<std::path::Path>) -> Result<Self> {
        let items = AppendLog::replay(log_path.as_ref())?;
        let history: DashMap<Key, Vec<Item>> = DashMap::new();
        let mut max_created_at = 0u64;

        for item in items {
            max_created_at = max_created_at.max(item.created_at);
            history.entry(item.key.clone()).or_default().push(item);
        }
        for mut entry in history.iter_mut() {
            entry
                .value_mut()
                .sort_by_key(|item| (item.created_at, item.version));
        }

        let log = AppendLog::open(log_path)?;
        let next_created_at = max_created_at.saturating_add(1).max(now_nanos());

        Ok(StorageCore {
            history,
            writer: Mutex::new(WriterState {
                log,
                next_created_at,
            }),
            limits: Limits::default(),
            consecutive_write_failures: AtomicU64::new(0),
        })
    }

    /// Open with custom size limits (used by tests).
    pub fn with_limits(self, limits: Limits) -> Self {
        StorageCore { limits, ..self }
    }

    /// Append a new version of `key`. Returns the assigned version.
    pub fn put(
        &self,
        key: &str,
        value: Vec<u8>,
        metadata: Metadata,
        agent_id: &str,
        session_id: &str,
        embedding: Option<Vec<f32>>,
    ) -> Result<u64> {
        self.limits.validate_key(key)?;
        self.limits.validate_value(&value)?;

        let mut writer = self.writer.lock();
        let created_at = writer.next_created_at;
        writer.next_created_at += 1;

        let version = self
            .history
            .get(key)
            .map(|h| h.len() as u64 + 1)
            .unwrap_or(1);

        let item = Item {
            key: key.to_string(),
            value,
            metadata,
            created_at,
            agent_id: agent_id.to_string(),
            session_id: session_id.to_string(),
            version,
            embedding,
        };

        match writer.log.append(&item) {
            Ok(()) => {
                self.consecutive_write_failures.store(0, Ordering::SeqCst);
            }
            Err(e) => {
                self.consecutive_write_failures
                    .fetch_add(1, Ordering::SeqCst);
                return Err(e);
            }
        }

        self.history.entry(key.to_string()).or_default().push(item);
        tracing::debug!(key, version, agent_id, "stored item version");
        Ok(version)
    }

    /// How many consecutive `put` calls have failed to write their log
    /// record. The dispatcher exits with code 2 once this reaches 3
    /// (spec §7).
    pub fn consecutive_write_failures(&self) -> u64 {
        self.consecutive_write_failures.load(Ordering::SeqCst)
    }

    /// Current version of `key`.
    pub fn get(&self, key: &str) -> Result<Item> {
        self.history
            .get(key)
            .and_then(|h| h.last().cloned())
            .ok_or_else(|| Error::NotFound(key.to_string()))
    }

    /// Read `key` as of `snapshot`.
    pub fn get_with_snapshot(&self, key: &str, snapshot: &Snapshot) -> Result<Item> {
        self.get_at(key, VersionQuery::Timestamp(snapshot.as_of))
    }

    /// An exact version, or the latest version at or before a timestamp.
    pub fn get_at(&self, key: &str, query: VersionQuery) -> Result<Item> {
        let history = self
            .history
            .get(key)
            .ok_or_else(|| Error::NotFound(key.to_string()))?;
        let found = match query {
            VersionQuery::Version(v) => history.iter().find(|i| i.version == v),
            VersionQuery::Timestamp(ts) => history.iter().rev().find(|i| i.created_at <= ts),
        };
        found.cloned().ok_or_else(|| Error::NotFound(key.to_string()))
    }

    /// History of `key` in descending `created_at` order, honoring `limit`
    /// (default 10) and `since` (a lower bound on `created_at`).
    pub fn history(&self, key: &str, limit: usize, since: Option<u64>) -> Result<Vec<Item>> {
        let history = self
            .history
            .get(key)
            .ok_or_else(|| Error::NotFound(key.to_string()))?;
        let mut items: Vec<Item> = history
            .iter()
            .rev()
            .filter(|i| since.map_or(true, |s| i.created_at >= s))
            .take(limit)
            .cloned()
            .collect();
        items.shrink_to_fit();
        Ok(items)
    }

    /// Take a consistent read view for the duration of one request.
    pub fn snapshot(&self) -> Snapshot {
        // Reading next_created_at under the writer lock guarantees the
        // snapshot ceiling never falls inside an in-flight put.
        let writer = self.writer.lock();
        Snapshot::new(writer.next_created_at.saturating_sub(1))
    }

    /// Whether `key` has ever been stored (used by LINK's endpoint check).
    pub fn contains(&self, key: &str) -> bool {
        self.history.contains_key(key)
    }
}

fn now_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
