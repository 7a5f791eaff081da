//! The `meta` file: records the embedding dimension and HNSW seed a log
//! directory was created with, so a later `serve` with mismatched flags
//! fails fast instead of silently corrupting the vector index (spec §6:
//! "mismatch with flags is fatal").

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Meta {
    pub embedding_dimensions: usize,
    pub hnsw_seed: u64,
}

impl Meta {
    /// Read `meta` if present and check it against the flags this process
    /// was started with; otherwise write a fresh one. Returns an error
    /// message (startup failure, exit code 1) on mismatch or I/O failure.
    pub fn reconcile(dir: &Path, embedding_dimensions: usize, hnsw_seed: u64) -> Result<(), String> {
        let path = dir.join("meta");
        let wanted = Meta {
            embedding_dimensions,
            hnsw_seed,
        };

        if path.exists() {
            let raw = std::fs::read_to_string(&path).map_err(|e| format!("failed to read meta: {e}"))?;
            let found: Meta = serde_json::from_str(&raw).map_err(|e| format!("meta file is corrupt: {e}"))?;
            if found != wanted {
                return Err(format!(
                    "embedding_dimensions/hnsw_seed mismatch: log directory was created with {:?}, flags specify {:?}",
                    found, wanted
                ));
            }
            return Ok(());
        }

        std::fs::create_dir_all(dir).map_err(|e| format!("failed to create log directory: {e}"))?;
        let raw = serde_json::to_string(&wanted).map_err(|e| format!("failed to encode meta: {e}"))?;
        std::fs::write(&path, raw).map_err(|e| format!("failed to write meta: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_run_writes_meta() {
        let dir = tempfile::tempdir().unwrap();
        Meta::reconcile(dir.path(), 4, 7).unwrap();
        let raw = std::fs::read_to_string(dir.path().join("meta")).unwrap();
        let found: Meta = serde_json::from_str(&raw).unwrap();
        assert_eq!(found, Meta { embedding_dimensions: 4, hnsw_seed: 7 });
    }

    #[test]
    fn matching_second_run_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        Meta::reconcile(dir.path(), 4, 7).unwrap();
        assert!(Meta::reconcile(dir.path(), 4, 7).is_ok());
    }

    #[test]
    fn mismatched_second_run_fails() {
        let dir = tempfile::tempdir().unwrap();
        Meta::reconcile(dir.path(), 4, 7).unwrap();
        let err = Meta::reconcile(dir.path(), 8, 7).unwrap_err();
        assert!(err.contains("mismatch"));
    }
}
