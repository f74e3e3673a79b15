//! Server-side JSON-RPC dispatch table.
//!
//! Maps method names to handlers over an ordered set of registered tools.
//! `handle` never fails: every failure path is captured and converted into an
//! error envelope carrying the originating request id.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::protocol::{
    InitializeParams, JsonRpcError, JsonRpcRequest, JsonRpcResponse, ToolCallParams, ToolResult,
    ToolsListParams, JSONRPC_VERSION,
};
use crate::schema;
use crate::tool::Tool;

/// Fixed page size for `tools/list`.
pub const TOOLS_PAGE_SIZE: usize = 10;

/// Dispatch table over an ordered list of tools.
///
/// The tool list is fixed at construction; `tools/list` pagination relies on
/// its stable order.
pub struct RpcHandler {
    tools: Vec<Arc<dyn Tool>>,
    should_exit: AtomicBool,
}

impl RpcHandler {
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Self {
        Self {
            tools,
            should_exit: AtomicBool::new(false),
        }
    }

    /// Whether an `exit` request has been handled. Observed by run loops.
    pub fn should_exit(&self) -> bool {
        self.should_exit.load(Ordering::SeqCst)
    }

    /// Handle a JSON-RPC request.
    ///
    /// Returns `None` only for notifications that require no response.
    pub async fn handle(&self, req: &JsonRpcRequest) -> Option<JsonRpcResponse> {
        if req.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::error(
                req.id.clone(),
                JsonRpcError::invalid_request(),
            ));
        }

        match req.method.as_str() {
            "initialize" => Some(self.handle_initialize(req)),
            "notifications/initialized" => None,
            "ping" => Some(JsonRpcResponse::success(req.id.clone(), json!({}))),
            "tools/list" => Some(self.handle_tools_list(req)),
            "tools/call" => Some(self.handle_tools_call(req).await),
            "exit" => {
                self.should_exit.store(true, Ordering::SeqCst);
                Some(JsonRpcResponse::success(req.id.clone(), json!({})))
            }
            "resources/list" => {
                Some(JsonRpcResponse::success(req.id.clone(), json!({ "resources": [] })))
            }
            "prompts/list" => {
                Some(JsonRpcResponse::success(req.id.clone(), json!({ "prompts": [] })))
            }
            _ => Some(JsonRpcResponse::error(
                req.id.clone(),
                JsonRpcError::method_not_found(&req.method),
            )),
        }
    }

    fn handle_initialize(&self, req: &JsonRpcRequest) -> JsonRpcResponse {
        let params: Option<InitializeParams> = req
            .params
            .clone()
            .and_then(|v| serde_json::from_value(v).ok());
        let protocol_version = params.and_then(|p| p.protocol_version);

        debug!(?protocol_version, "initialize");
        let result = json!({
            "serverInfo": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION")
            },
            "capabilities": {
                "tools": {}
            },
            // Echoed back unmodified; version negotiation is the caller's
            // concern.
            "protocolVersion": protocol_version
        });
        JsonRpcResponse::success(req.id.clone(), result)
    }

    fn handle_tools_list(&self, req: &JsonRpcRequest) -> JsonRpcResponse {
        let params: ToolsListParams = match &req.params {
            Some(v) => match serde_json::from_value(v.clone()) {
                Ok(p) => p,
                Err(e) => {
                    return JsonRpcResponse::error(
                        req.id.clone(),
                        JsonRpcError::invalid_params(format!("Invalid tools/list params: {e}")),
                    );
                }
            },
            None => ToolsListParams::default(),
        };

        // The cursor is the decimal string of the start offset into the
        // stable tool list.
        let offset = match &params.cursor {
            None => 0,
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) => n,
                Err(_) => {
                    return JsonRpcResponse::error(
                        req.id.clone(),
                        JsonRpcError::invalid_params("Invalid cursor format"),
                    );
                }
            },
        };

        let end = offset.saturating_add(TOOLS_PAGE_SIZE).min(self.tools.len());
        let page: Vec<Value> = self
            .tools
            .get(offset..end)
            .unwrap_or(&[])
            .iter()
            .map(|t| serde_json::to_value(t.descriptor()).unwrap_or(Value::Null))
            .collect();

        let mut result = json!({ "tools": page });
        if end < self.tools.len() {
            result["nextCursor"] = Value::String(end.to_string());
        }
        JsonRpcResponse::success(req.id.clone(), result)
    }

    async fn handle_tools_call(&self, req: &JsonRpcRequest) -> JsonRpcResponse {
        let params: ToolCallParams = match &req.params {
            Some(v) => match serde_json::from_value(v.clone()) {
                Ok(p) => p,
                Err(e) => {
                    return JsonRpcResponse::error(
                        req.id.clone(),
                        JsonRpcError::invalid_params(format!("Invalid tools/call params: {e}")),
                    );
                }
            },
            None => {
                return JsonRpcResponse::error(
                    req.id.clone(),
                    JsonRpcError::invalid_params("Missing params for tools/call"),
                );
            }
        };

        // Linear scan, first match; registration order is the tie-breaker.
        let tool = match self.tools.iter().find(|t| t.name() == params.name) {
            Some(t) => t,
            None => {
                return JsonRpcResponse::error(
                    req.id.clone(),
                    JsonRpcError::tool_not_found(&params.name),
                );
            }
        };

        let tool_result = run_tool(tool.as_ref(), params.arguments).await;
        let result_json = serde_json::to_value(&tool_result)
            .unwrap_or_else(|_| json!({ "content": [], "isError": true }));
        JsonRpcResponse::success(req.id.clone(), result_json)
    }
}

/// Execute one tool call, folding every failure into an `isError` payload.
async fn run_tool(tool: &dyn Tool, arguments: Option<Value>) -> ToolResult {
    let arguments: Map<String, Value> = match arguments {
        None => Map::new(),
        Some(Value::Object(map)) => map,
        Some(other) => {
            return ToolResult::error(format!(
                "Arguments for tool '{}' must be an object, got {other}",
                tool.name()
            ));
        }
    };

    let schema = tool.input_schema();
    if let Err(e) = schema::validate_arguments(&schema, &Value::Object(arguments.clone())) {
        warn!(tool = tool.name(), error = %e, "tool arguments rejected by schema");
        return ToolResult::error(format!("Invalid arguments for tool '{}': {e}", tool.name()));
    }

    match tool.call(arguments).await {
        Ok(value) => {
            let text = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            ToolResult::text(text)
        }
        Err(e) => {
            warn!(tool = tool.name(), error = %e, "tool execution failed");
            ToolResult::error(format!("Tool '{}' failed: {e}", tool.name()))
        }
    }
}
