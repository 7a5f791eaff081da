//! `AgramaConfig`: flags + environment resolved into one startup config
//! (spec §4.I).
//!
//! Hand-rolled parsing over `std::env::args`, in the teacher's own
//! `crates/cli` idiom — no external flag-parsing crate, since the surface
//! is four flags and one subcommand.

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_EMBEDDING_DIMENSIONS: usize = 768;
const DEFAULT_QUEUE_CAPACITY: usize = 1024;
const DEFAULT_CALL_TIMEOUT_SECS: u64 = 5;
const DEFAULT_RESULT_CACHE_CAPACITY: usize = 1024;
const DEFAULT_LOG_DIR: &str = "agrama-data";

#[derive(Debug, Clone)]
pub struct AgramaConfig {
    pub log_path: PathBuf,
    pub embedding_dimensions: usize,
    pub max_concurrency: usize,
    pub hnsw_seed: u64,
    pub queue_capacity: usize,
    pub call_timeout: Duration,
    pub result_cache_capacity: usize,
}

impl AgramaConfig {
    /// Parse `serve`'s flags, then apply environment overrides
    /// (`AGRAMA_DB_PATH` wins over `--log-path`, per spec.md §6).
    pub fn from_args(args: &[String]) -> Result<Self, String> {
        let mut log_path: Option<PathBuf> = None;
        let mut embedding_dimensions = DEFAULT_EMBEDDING_DIMENSIONS;
        let mut max_concurrency = default_concurrency();
        let mut hnsw_seed: u64 = 0;

        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            let value = |iter: &mut std::slice::Iter<'_, String>, flag: &str| {
                iter.next().cloned().ok_or_else(|| format!("{flag} requires a value"))
            };
            match arg.as_str() {
                "--log-path" => log_path = Some(PathBuf::from(value(&mut iter, "--log-path")?)),
                "--embedding-dimensions" => {
                    embedding_dimensions = value(&mut iter, "--embedding-dimensions")?
                        .parse()
                        .map_err(|_| "--embedding-dimensions must be a positive integer".to_string())?;
                }
                "--max-concurrency" => {
                    max_concurrency = value(&mut iter, "--max-concurrency")?
                        .parse()
                        .map_err(|_| "--max-concurrency must be a positive integer".to_string())?;
                }
                "--hnsw-seed" => {
                    hnsw_seed = value(&mut iter, "--hnsw-seed")?
                        .parse()
                        .map_err(|_| "--hnsw-seed must be an unsigned integer".to_string())?;
                }
                other => return Err(format!("unrecognized flag: {other}")),
            }
        }

        let log_path = std::env::var("AGRAMA_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| log_path.unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR)));

        Ok(AgramaConfig {
            log_path,
            embedding_dimensions,
            max_concurrency: max_concurrency.clamp(2, 32),
            hnsw_seed,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            call_timeout: Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS),
            result_cache_capacity: DEFAULT_RESULT_CACHE_CAPACITY,
        })
    }
}

fn default_concurrency() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(2)
}

/// `AGRAMA_LOG_LEVEL` parsed into a `tracing_subscriber` filter directive,
/// defaulting to `info` (spec.md §6, SPEC_FULL.md §4.I).
pub fn log_level_directive() -> String {
    std::env::var("AGRAMA_LOG_LEVEL")
        .ok()
        .filter(|lvl| matches!(lvl.as_str(), "debug" | "info" | "warn" | "error"))
        .unwrap_or_else(|| "info".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let config = AgramaConfig::from_args(&[]).unwrap();
        assert_eq!(config.embedding_dimensions, 768);
        assert_eq!(config.queue_capacity, 1024);
        assert_eq!(config.result_cache_capacity, 1024);
    }

    #[test]
    fn parses_all_four_flags() {
        let args: Vec<String> = [
            "--log-path",
            "/tmp/agrama-test",
            "--embedding-dimensions",
            "4",
            "--max-concurrency",
            "8",
            "--hnsw-seed",
            "7",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let config = AgramaConfig::from_args(&args).unwrap();
        assert_eq!(config.log_path, PathBuf::from("/tmp/agrama-test"));
        assert_eq!(config.embedding_dimensions, 4);
        assert_eq!(config.max_concurrency, 8);
        assert_eq!(config.hnsw_seed, 7);
    }

    #[test]
    fn max_concurrency_is_clamped() {
        let args: Vec<String> = ["--max-concurrency", "1000"].iter().map(|s| s.to_string()).collect();
        let config = AgramaConfig::from_args(&args).unwrap();
        assert_eq!(config.max_concurrency, 32);
    }

    #[test]
    fn unrecognized_flag_is_rejected() {
        let args: Vec<String> = ["--bogus", "x"].iter().map(|s| s.to_string()).collect();
        assert!(AgramaConfig::from_args(&args).is_err());
    }

    #[test]
    fn dangling_flag_without_value_is_rejected() {
        let args: Vec<String> = ["--log-path"].iter().map(|s| s.to_string()).collect();
        assert!(AgramaConfig::from_args(&args).is_err());
    }
}
