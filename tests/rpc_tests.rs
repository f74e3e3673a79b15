//! Integration tests for the dispatch table: method routing, pagination,
//! tool invocation, and the HTTP body entry point.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use mcp_toolbus::protocol::{JsonRpcRequest, RpcId};
use mcp_toolbus::rpc::{RpcHandler, TOOLS_PAGE_SIZE};
use mcp_toolbus::server::handle_http_body;
use mcp_toolbus::tool::{Tool, ToolError};

/// Minimal tool with a configurable name; optionally fails on every call.
struct StaticTool {
    name: String,
    fail: bool,
}

impl StaticTool {
    fn named(name: &str) -> Arc<dyn Tool> {
        Arc::new(Self { name: name.to_string(), fail: false })
    }

    fn failing(name: &str) -> Arc<dyn Tool> {
        Arc::new(Self { name: name.to_string(), fail: true })
    }
}

#[async_trait]
impl Tool for StaticTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "test tool"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "value": { "type": "string" }
            }
        })
    }

    async fn call(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        if self.fail {
            return Err(ToolError::new("deliberate failure"));
        }
        Ok(json!({ "tool": self.name, "got": Value::Object(arguments) }))
    }
}

fn handler_with(count: usize) -> RpcHandler {
    let tools = (0..count)
        .map(|i| StaticTool::named(&format!("tool_{i:02}")))
        .collect();
    RpcHandler::new(tools)
}

fn request(method: &str, params: Value) -> JsonRpcRequest {
    JsonRpcRequest::new(method).with_params(params).with_id(7)
}

// ---------------------------------------------------------------------------
// Envelope shape
// ---------------------------------------------------------------------------

#[tokio::test]
async fn every_method_returns_exactly_one_of_result_or_error() {
    let handler = handler_with(3);
    for method in [
        "initialize",
        "ping",
        "tools/list",
        "tools/call",
        "exit",
        "resources/list",
        "prompts/list",
        "no/such/method",
    ] {
        let req = request(method, json!({}));
        let resp = handler.handle(&req).await.expect("response expected");
        assert_eq!(
            resp.result.is_some() ^ resp.error.is_some(),
            true,
            "method {method} must produce exactly one of result/error"
        );
        assert_eq!(resp.id, Some(RpcId::Number(7)), "method {method} must echo the id");
    }
}

#[tokio::test]
async fn unknown_method_is_method_not_found() {
    let handler = handler_with(1);
    let resp = handler
        .handle(&request("bogus", json!({})))
        .await
        .unwrap();
    assert_eq!(resp.error.unwrap().code, -32601);
}

#[tokio::test]
async fn wrong_jsonrpc_version_is_invalid_request() {
    let handler = handler_with(1);
    let mut req = request("ping", json!({}));
    req.jsonrpc = "1.0".into();
    let resp = handler.handle(&req).await.unwrap();
    assert_eq!(resp.error.unwrap().code, -32600);
}

#[tokio::test]
async fn initialize_echoes_protocol_version() {
    let handler = handler_with(0);
    let req = request("initialize", json!({ "protocolVersion": "2024-11-05" }));
    let resp = handler.handle(&req).await.unwrap();
    let result = resp.result.unwrap();
    assert_eq!(result["protocolVersion"], "2024-11-05");
    assert!(result["serverInfo"]["name"].is_string());
    assert!(result["capabilities"]["tools"].is_object());
}

// ---------------------------------------------------------------------------
// tools/list pagination
// ---------------------------------------------------------------------------

#[tokio::test]
async fn tools_list_first_page_and_cursor() {
    let n = TOOLS_PAGE_SIZE + 5;
    let handler = handler_with(n);

    let resp = handler.handle(&request("tools/list", json!({}))).await.unwrap();
    let result = resp.result.unwrap();
    let tools = result["tools"].as_array().unwrap();
    assert_eq!(tools.len(), TOOLS_PAGE_SIZE);
    assert_eq!(result["nextCursor"], TOOLS_PAGE_SIZE.to_string());

    let resp = handler
        .handle(&request("tools/list", json!({ "cursor": TOOLS_PAGE_SIZE.to_string() })))
        .await
        .unwrap();
    let result = resp.result.unwrap();
    let tools = result["tools"].as_array().unwrap();
    assert_eq!(tools.len(), n - TOOLS_PAGE_SIZE);
    assert!(
        result.get("nextCursor").is_none(),
        "last page must not carry a cursor"
    );
    assert_eq!(tools[0]["name"], "tool_10", "second page resumes at the offset");
}

#[tokio::test]
async fn tools_list_small_catalog_has_no_cursor() {
    let handler = handler_with(3);
    let resp = handler.handle(&request("tools/list", json!({}))).await.unwrap();
    let result = resp.result.unwrap();
    assert_eq!(result["tools"].as_array().unwrap().len(), 3);
    assert!(result.get("nextCursor").is_none());
}

#[tokio::test]
async fn tools_list_missing_params_starts_at_zero() {
    let handler = handler_with(2);
    let req = JsonRpcRequest::new("tools/list").with_id(1);
    let resp = handler.handle(&req).await.unwrap();
    assert_eq!(resp.result.unwrap()["tools"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn invalid_cursor_is_invalid_params() {
    let handler = handler_with(3);
    for cursor in ["abc", "-1", "1.5", ""] {
        let resp = handler
            .handle(&request("tools/list", json!({ "cursor": cursor })))
            .await
            .unwrap();
        let err = resp.error.expect("invalid cursor must be an error");
        assert_eq!(err.code, -32602, "cursor {cursor:?}");
        assert_eq!(err.message, "Invalid cursor format");
    }
}

#[tokio::test]
async fn tools_list_descriptors_carry_schema() {
    let handler = handler_with(1);
    let resp = handler.handle(&request("tools/list", json!({}))).await.unwrap();
    let tools = resp.result.unwrap()["tools"].clone();
    assert_eq!(tools[0]["name"], "tool_00");
    assert_eq!(tools[0]["description"], "test tool");
    assert_eq!(tools[0]["inputSchema"]["type"], "object");
}

// ---------------------------------------------------------------------------
// tools/call
// ---------------------------------------------------------------------------

#[tokio::test]
async fn tools_call_success_wraps_content() {
    let handler = handler_with(1);
    let req = request(
        "tools/call",
        json!({ "name": "tool_00", "arguments": { "value": "hi" } }),
    );
    let resp = handler.handle(&req).await.unwrap();
    let result = resp.result.unwrap();
    assert!(result.get("isError").is_none(), "success omits isError");
    let text = result["content"][0]["text"].as_str().unwrap();
    let payload: Value = serde_json::from_str(text).unwrap();
    assert_eq!(payload["got"]["value"], "hi");
}

#[tokio::test]
async fn tools_call_unknown_tool_is_method_not_found_code() {
    let handler = handler_with(1);
    let req = request("tools/call", json!({ "name": "nope", "arguments": {} }));
    let resp = handler.handle(&req).await.unwrap();
    let err = resp.error.unwrap();
    assert_eq!(err.code, -32601);
    assert!(err.message.contains("nope"));
}

#[tokio::test]
async fn tool_failure_becomes_is_error_payload_not_protocol_error() {
    let handler = RpcHandler::new(vec![StaticTool::failing("broken")]);
    let req = request("tools/call", json!({ "name": "broken", "arguments": {} }));
    let resp = handler.handle(&req).await.unwrap();
    assert!(resp.error.is_none(), "tool failure is not a protocol error");
    let result = resp.result.unwrap();
    assert_eq!(result["isError"], true);
    let text = result["content"][0]["text"].as_str().unwrap();
    assert!(!text.is_empty());
    assert!(text.contains("deliberate failure"));
}

#[tokio::test]
async fn schema_invalid_arguments_become_is_error_payload() {
    let handler = handler_with(1);
    let req = request(
        "tools/call",
        json!({ "name": "tool_00", "arguments": { "value": 42 } }),
    );
    let resp = handler.handle(&req).await.unwrap();
    let result = resp.result.unwrap();
    assert_eq!(result["isError"], true);
}

#[tokio::test]
async fn tools_call_without_params_is_invalid_params() {
    let handler = handler_with(1);
    let req = JsonRpcRequest::new("tools/call").with_id(3);
    let resp = handler.handle(&req).await.unwrap();
    assert_eq!(resp.error.unwrap().code, -32602);
}

// ---------------------------------------------------------------------------
// exit and reserved list methods
// ---------------------------------------------------------------------------

#[tokio::test]
async fn exit_sets_should_exit_flag() {
    let handler = handler_with(0);
    assert!(!handler.should_exit());
    let resp = handler.handle(&request("exit", json!({}))).await.unwrap();
    assert!(resp.result.is_some());
    assert!(handler.should_exit());
}

#[tokio::test]
async fn reserved_list_methods_are_empty_without_cursor() {
    let handler = handler_with(5);

    let resp = handler.handle(&request("resources/list", json!({}))).await.unwrap();
    let result = resp.result.unwrap();
    assert!(result["resources"].as_array().unwrap().is_empty());
    assert!(result.get("nextCursor").is_none());

    let resp = handler.handle(&request("prompts/list", json!({}))).await.unwrap();
    let result = resp.result.unwrap();
    assert!(result["prompts"].as_array().unwrap().is_empty());
    assert!(result.get("nextCursor").is_none());
}

#[tokio::test]
async fn initialized_notification_has_no_response() {
    let handler = handler_with(0);
    let req = JsonRpcRequest::new("notifications/initialized");
    assert!(handler.handle(&req).await.is_none());
}

// ---------------------------------------------------------------------------
// HTTP body entry point
// ---------------------------------------------------------------------------

#[tokio::test]
async fn http_entry_maps_parse_error_to_400() {
    let handler = handler_with(1);
    let (status, body) = handle_http_body(&handler, "{not json").await;
    assert_eq!(status, 400);
    let resp: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(resp["error"]["code"], -32700);
    assert!(resp["id"].is_null());
}

#[tokio::test]
async fn http_entry_maps_schema_failure_to_400() {
    let handler = handler_with(1);
    let (status, body) = handle_http_body(&handler, r#"{"foo": 1}"#).await;
    assert_eq!(status, 400);
    let resp: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(resp["error"]["code"], -32600);
}

#[tokio::test]
async fn http_entry_maps_handled_request_to_200() {
    let handler = handler_with(1);
    let body = r#"{"jsonrpc":"2.0","id":5,"method":"tools/list","params":{}}"#;
    let (status, body) = handle_http_body(&handler, body).await;
    assert_eq!(status, 200);
    let resp: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(resp["id"], 5);
    assert_eq!(resp["result"]["tools"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn http_entry_keeps_method_not_found_at_200() {
    let handler = handler_with(1);
    let body = r#"{"jsonrpc":"2.0","id":9,"method":"bogus"}"#;
    let (status, body) = handle_http_body(&handler, body).await;
    assert_eq!(status, 200, "handled protocol errors stay 200");
    let resp: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(resp["error"]["code"], -32601);
}
