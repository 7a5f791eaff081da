//! Storage Core: per-key versioned value log with a single-file append log
//! (spec §4.A).

mod core;
mod log;
mod snapshot;

pub use crate::core::{StorageCore, VersionQuery};
pub use log::AppendLog;
pub use snapshot::Snapshot;
