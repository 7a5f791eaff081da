//! Request Dispatcher: line-delimited JSON-RPC 2.0 over stdio, backed by
//! a worker pool and a sequence-ordered response writer (spec §4.G, §5, §6).

pub mod dispatcher;
pub mod identity;
pub mod types;
pub mod worker_pool;

pub use dispatcher::{Dispatcher, DispatcherConfig, ExitReason};
pub use identity::{Identity, IdentityRegistry};
pub use types::{error_to_body, JsonRpcErrorBody, JsonRpcRequest, JsonRpcResponse, RpcErrorCode};
pub use worker_pool::WorkerPool;
