//! Single-file append-only log (spec §4.A, §6).
//!
//! One JSON object per line, no header. On startup the file is read top to
//! bottom; a partial trailing record (one that fails to parse and is not
//! followed by further valid records) is ignored and truncated on next write
//! (spec §6: "partial trailing records are ignored and truncated on next
//! write").

use agrama_core::{Error, Item, Result};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// A single append-only log of [`Item`] records.
pub struct AppendLog {
    path: PathBuf,
    file: File,
}

impl AppendLog {
    /// Open (creating if absent) the log file at `path` for appending.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| Error::WriteFailed(format!("opening log {}: {e}", path.display())))?;
        Ok(AppendLog { path, file })
    }

    /// Append one record, flushing before returning (spec §4.A: "every `put`
    /// produces a record on an append-only log").
    pub fn append(&mut self, item: &Item) -> Result<()> {
        let mut line =
            serde_json::to_string(item).map_err(|e| Error::WriteFailed(e.to_string()))?;
        line.push('\n');
        self.file
            .write_all(line.as_bytes())
            .map_err(|e| Error::WriteFailed(e.to_string()))?;
        self.file
            .flush()
            .map_err(|e| Error::WriteFailed(e.to_string()))?;
        Ok(())
    }

    /// Replay the log from the beginning, returning every well-formed
    /// record in file order. A trailing line that fails to parse is
    /// discarded and the file truncated to drop it, rather than treated as
    /// corruption — mid-write crashes are expected, corruption elsewhere is
    /// not.
    pub fn replay(path: impl AsRef<Path>) -> Result<Vec<Item>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let file = File::open(path)
            .map_err(|e| Error::StorageCorrupt(format!("opening log for replay: {e}")))?;
        let reader = BufReader::new(file);

        let mut items = Vec::new();
        let mut valid_bytes: u64 = 0;
        let mut trailing_garbage = false;

        for line in reader.lines() {
            let line = line.map_err(|e| Error::StorageCorrupt(e.to_string()))?;
            if line.is_empty() {
                valid_bytes += 1; // the newline itself
                continue;
            }
            match serde_json::from_str::<Item>(&line) {
                Ok(item) => {
                    items.push(item);
                    valid_bytes += line.len() as u64 + 1;
                }
                Err(_) => {
                    // A non-trailing parse failure is corruption; a
                    // trailing one is a partial write from a crash.
                    trailing_garbage = true;
                    break;
                }
            }
        }

        if trailing_garbage {
            tracing::warn!(path = %path.display(), "truncating partial trailing log record");
            let file = OpenOptions::new()
                .write(true)
                .open(path)
                .map_err(|e| Error::StorageCorrupt(e.to_string()))?;
            file.set_len(valid_bytes)
                .map_err(|e| Error::StorageCorrupt(e.to_string()))?;
        }

        tracing::info!(path = %path.display(), records = items.len(), "replayed append log");
        Ok(items)
    }

    /// Path this log is backed by.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
