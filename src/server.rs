//! Server entry points: the stdio run loop and the HTTP body seam.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};

use crate::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, JSONRPC_VERSION};
use crate::rpc::RpcHandler;

/// Maximum bytes per JSON-RPC message (1 MiB).
const MAX_MESSAGE_BYTES: usize = 1024 * 1024;

/// Tool server that communicates over stdio using newline-delimited
/// JSON-RPC 2.0. Stderr is reserved for log output, never protocol data.
pub struct StdioServer {
    handler: RpcHandler,
}

impl StdioServer {
    pub fn new(handler: RpcHandler) -> Self {
        Self { handler }
    }

    pub async fn run(&self) -> Result<(), std::io::Error> {
        let stdin = tokio::io::stdin();
        let mut stdout = tokio::io::stdout();
        let mut reader = BufReader::new(stdin);
        let mut raw = Vec::new();

        info!("stdio server ready");
        loop {
            raw.clear();
            let n = reader.read_until(b'\n', &mut raw).await?;
            if n == 0 {
                break;
            }

            if n > MAX_MESSAGE_BYTES {
                error!(bytes = n, limit = MAX_MESSAGE_BYTES, "message too large");
                write_response(
                    &mut stdout,
                    &JsonRpcResponse::error(None, JsonRpcError::parse_error()),
                )
                .await?;
                continue;
            }

            let trimmed = match std::str::from_utf8(&raw) {
                Ok(s) => s.trim(),
                Err(_) => {
                    write_response(
                        &mut stdout,
                        &JsonRpcResponse::error(None, JsonRpcError::parse_error()),
                    )
                    .await?;
                    continue;
                }
            };

            if trimmed.is_empty() {
                continue;
            }

            let req: JsonRpcRequest = match serde_json::from_str(trimmed) {
                Ok(r) => r,
                Err(e) => {
                    error!(error = %e, "parse error");
                    write_response(
                        &mut stdout,
                        &JsonRpcResponse::error(None, JsonRpcError::parse_error()),
                    )
                    .await?;
                    continue;
                }
            };

            if let Some(resp) = self.handler.handle(&req).await {
                write_response(&mut stdout, &resp).await?;
            }

            if self.handler.should_exit() {
                info!("exit requested, shutting down");
                break;
            }
        }

        Ok(())
    }
}

async fn write_response(
    stdout: &mut tokio::io::Stdout,
    resp: &JsonRpcResponse,
) -> Result<(), std::io::Error> {
    let out = serde_json::to_string(resp).map_err(std::io::Error::other)?;
    stdout.write_all(out.as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await?;
    Ok(())
}

/// Handle one JSON body on behalf of an HTTP server collaborator.
///
/// The collaborator's only obligation is "receive JSON body, return JSON body
/// with this status code": malformed JSON maps to 400 with a parse-error
/// envelope, envelope-schema failures to 400 with an invalid-request envelope,
/// internal errors to 500, and every other handled method to 200.
pub async fn handle_http_body(handler: &RpcHandler, body: &str) -> (u16, String) {
    let value: serde_json::Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) => {
            let resp = JsonRpcResponse::error(None, JsonRpcError::parse_error());
            return (400, encode(&resp));
        }
    };

    let req: JsonRpcRequest = match serde_json::from_value(value) {
        Ok(r) => r,
        Err(e) => {
            let resp =
                JsonRpcResponse::error(None, JsonRpcError::invalid_request_with(e.to_string()));
            return (400, encode(&resp));
        }
    };

    if req.jsonrpc != JSONRPC_VERSION {
        let resp = JsonRpcResponse::error(req.id.clone(), JsonRpcError::invalid_request());
        return (400, encode(&resp));
    }

    let resp = match handler.handle(&req).await {
        Some(r) => r,
        None => JsonRpcResponse::success(req.id.clone(), serde_json::json!({})),
    };

    let status = match &resp.error {
        Some(e) if e.code == -32603 => 500,
        _ => 200,
    };
    (status, encode(&resp))
}

fn encode(resp: &JsonRpcResponse) -> String {
    serde_json::to_string(resp).unwrap_or_else(|_| {
        r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32603,"message":"Internal error"}}"#.into()
    })
}
