//! Unified error type for Agrama.
//!
//! Every component (storage, lexical, vector, graph, query, primitives,
//! dispatcher) reports failures through [`Error`]. The dispatcher maps each
//! variant to a JSON-RPC error code; see `agrama-dispatcher::codes`.

use thiserror::Error;

/// Result type alias used throughout Agrama.
pub type Result<T> = std::result::Result<T, Error>;

/// The failure taxonomy shared by all primitives (spec §4.F, §7).
#[derive(Debug, Error)]
pub enum Error {
    /// Schema/shape error in primitive arguments. Not retryable.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Key addressed by a read does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// LINK referenced a key that has never been stored.
    #[error("unknown key: {0}")]
    UnknownKey(String),

    /// TRANSFORM named an operation that isn't registered.
    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    /// A key or value exceeded a configured size bound.
    #[error("size exceeded: {0}")]
    SizeExceeded(String),

    /// An embedding's dimension didn't match the configured `D`.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Configured embedding dimension.
        expected: usize,
        /// Dimension of the offending vector.
        actual: usize,
    },

    /// Append-log write failed (I/O). Fatal after 3 consecutive failures.
    #[error("write failed: {0}")]
    WriteFailed(String),

    /// Recovery found the append log in an inconsistent state. Fatal.
    #[error("storage corrupt: {0}")]
    StorageCorrupt(String),

    /// A registered TRANSFORM operation failed at runtime.
    #[error("operation failed: {0}")]
    OperationFailed(String),

    /// The dispatcher's bounded call queue was full.
    #[error("busy")]
    Busy,

    /// The call was cancelled (wall-clock timeout or explicit signal).
    #[error("cancelled")]
    Cancelled,
}

impl Error {
    /// Short machine-readable kind string, used in stderr diagnostics and
    /// in the JSON-RPC error `data.kind` field.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidInput(_) => "InvalidInput",
            Error::NotFound(_) => "NotFound",
            Error::UnknownKey(_) => "UnknownKey",
            Error::UnknownOperation(_) => "UnknownOperation",
            Error::SizeExceeded(_) => "SizeExceeded",
            Error::DimensionMismatch { .. } => "DimensionMismatch",
            Error::WriteFailed(_) => "WriteFailed",
            Error::StorageCorrupt(_) => "StorageCorrupt",
            Error::OperationFailed(_) => "OperationFailed",
            Error::Busy => "Busy",
            Error::Cancelled => "Cancelled",
        }
    }

    /// Whether this error is fatal to the process (per spec §4.G, §7):
    /// `StorageCorrupt` is always fatal; `WriteFailed` is fatal only after
    /// three consecutive occurrences, which the caller tracks itself.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::StorageCorrupt(_))
    }
}
