pub mod request;
pub mod response;

pub use request::{InitializeParams, JsonRpcRequest, RpcId, ToolCallParams, ToolsListParams};
pub use response::{JsonRpcError, JsonRpcResponse, ToolResult, ToolResultContent};

/// JSON-RPC protocol version carried by every envelope.
pub const JSONRPC_VERSION: &str = "2.0";
