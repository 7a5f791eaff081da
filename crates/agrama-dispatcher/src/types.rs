//! JSON-RPC 2.0 envelope types (spec §4.G).
//!
//! Grounded on the teacher-adjacent MCP stdio transport: same shape, same
//! `Option<id>`-means-notification convention, extended here with
//! Agrama's own application error codes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: Option<String>,
    pub id: Option<Value>,
    pub method: Option<String>,
    #[serde(default)]
    pub params: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcErrorBody>,
}

impl JsonRpcResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        JsonRpcResponse {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Option<Value>, error: JsonRpcErrorBody) -> Self {
        JsonRpcResponse {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcErrorBody {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Standard JSON-RPC and Agrama application error codes (spec §4.G).
#[derive(Debug, Clone, Copy)]
pub enum RpcErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
    NotFound,
    SizeExceeded,
    DimensionMismatch,
    Busy,
    WriteFailed,
    StorageCorrupt,
    Cancelled,
}

impl RpcErrorCode {
    pub fn code(self) -> i32 {
        match self {
            RpcErrorCode::ParseError => -32700,
            RpcErrorCode::InvalidRequest => -32600,
            RpcErrorCode::MethodNotFound => -32601,
            RpcErrorCode::InvalidParams => -32602,
            RpcErrorCode::InternalError => -32603,
            RpcErrorCode::NotFound => -32001,
            RpcErrorCode::SizeExceeded => -32002,
            RpcErrorCode::DimensionMismatch => -32003,
            RpcErrorCode::Busy => -32020,
            RpcErrorCode::Cancelled => -32030,
            RpcErrorCode::WriteFailed => -32010,
            RpcErrorCode::StorageCorrupt => -32011,
        }
    }
}

/// Map a primitive's [`agrama_core::Error`] onto a JSON-RPC error body
/// (spec §4.G "Error code mapping").
pub fn error_to_body(err: &agrama_core::Error) -> JsonRpcErrorBody {
    use agrama_core::Error::*;
    let code = match err {
        InvalidInput(_) => RpcErrorCode::InvalidParams,
        UnknownOperation(_) => RpcErrorCode::MethodNotFound,
        NotFound(_) | UnknownKey(_) => RpcErrorCode::NotFound,
        SizeExceeded(_) => RpcErrorCode::SizeExceeded,
        DimensionMismatch { .. } => RpcErrorCode::DimensionMismatch,
        WriteFailed(_) => RpcErrorCode::WriteFailed,
        StorageCorrupt(_) => RpcErrorCode::StorageCorrupt,
        Busy => RpcErrorCode::Busy,
        Cancelled => RpcErrorCode::Cancelled,
        OperationFailed(_) => RpcErrorCode::InternalError,
    };
    JsonRpcErrorBody {
        code: code.code(),
        message: err.to_string(),
        data: None,
    }
}
