//! Stdio transport: newline-delimited JSON-RPC exchange with a child
//! process.
//!
//! The channel is a single ordered byte stream with no framing beyond the
//! newline, so `send` is single-flight: a mutex admits at most one
//! request/response cycle at a time.

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::gateway::{ChildProcessGateway, ProcessGateway};
use crate::protocol::{JsonRpcRequest, JsonRpcResponse, RpcId};
use crate::transport::{into_send_result, Lifecycle, SendError, Transport, TransportError};

/// Transport that owns a tool server running as a child process.
pub struct StdioTransport {
    command: Vec<String>,
    inner: Mutex<Inner>,
    state: Lifecycle,
}

struct Inner {
    gateway: Box<dyn ProcessGateway>,
    /// Identifier assigned to requests that arrive without one. Starts at 1,
    /// never reused within this transport's lifetime.
    next_id: i64,
}

impl StdioTransport {
    /// Build a transport around an executable command line (program plus
    /// arguments).
    pub fn new(command: Vec<String>) -> Self {
        Self::with_gateway(command, Box::new(ChildProcessGateway::new()))
    }

    /// Build with an explicit gateway. Tests use this to script the child's
    /// behavior without a real process.
    pub fn with_gateway(command: Vec<String>, gateway: Box<dyn ProcessGateway>) -> Self {
        Self {
            command,
            inner: Mutex::new(Inner { gateway, next_id: 1 }),
            state: Lifecycle::Uninitialized,
        }
    }
}

#[async_trait]
impl Transport for StdioTransport {
    async fn initialize(&mut self) -> Result<(), TransportError> {
        if self.state == Lifecycle::ShutDown {
            return Err(TransportError::ShutDown);
        }
        let inner = self.inner.get_mut();
        let pid = inner.gateway.start(&self.command).await?;
        self.state = Lifecycle::Initialized;
        info!(pid, command = ?self.command, "stdio transport initialized");
        Ok(())
    }

    async fn send(&self, mut request: JsonRpcRequest) -> Result<JsonRpcResponse, SendError> {
        if self.state != Lifecycle::Initialized {
            return Err(TransportError::NotInitialized("subprocess not started").into());
        }

        // Single-flight: one request/response cycle per transport at a time.
        let mut inner = self.inner.lock().await;

        if !inner.gateway.is_running() {
            let exit = inner
                .gateway
                .exit_status()
                .unwrap_or_else(|| "unknown".into());
            return Err(TransportError::ProcessUnavailable(format!(
                "process terminated ({exit})"
            ))
            .into());
        }

        if request.id.is_none() {
            request.id = Some(RpcId::Number(inner.next_id));
            inner.next_id += 1;
        }
        let request_id = request.id.clone();

        let line = serde_json::to_string(&request)
            .map_err(|e| TransportError::InvalidBody(e.to_string()))?;
        debug!(payload = %line, "sending stdio request");

        if let Err(e) = inner.gateway.write_line(&line).await {
            let exit = inner
                .gateway
                .exit_status()
                .unwrap_or_else(|| "unknown".into());
            let stderr = inner.gateway.drain_stderr().await;
            warn!(%exit, %stderr, "write to subprocess failed");
            return Err(TransportError::BrokenPipe {
                exit: format!("{exit}; write failed: {e}"),
                stderr,
            }
            .into());
        }

        let line = match inner.gateway.read_line().await {
            Ok(line) => line,
            Err(e) => {
                let stderr = inner.gateway.drain_stderr().await;
                warn!(error = %e, %stderr, "no response from subprocess");
                return Err(TransportError::EndOfStream {
                    detail: format!("{e}; stderr: {stderr}"),
                }
                .into());
            }
        };

        let response: JsonRpcResponse = serde_json::from_str(&line)
            .map_err(|e| TransportError::InvalidBody(e.to_string()))?;

        // Mismatched correlation ids are tolerated: logged, and the response
        // is still handed to the caller.
        if response.id != request_id {
            warn!(
                expected = ?request_id,
                actual = ?response.id,
                "response id does not match request id"
            );
        }

        into_send_result(response)
    }

    async fn shutdown(&mut self) -> Result<(), TransportError> {
        if self.state != Lifecycle::Initialized {
            return Ok(());
        }
        self.state = Lifecycle::ShutDown;

        let inner = self.inner.get_mut();
        if inner.gateway.is_running() {
            let exit_request = JsonRpcRequest::new("exit")
                .with_params(serde_json::json!({}))
                .with_id(RpcId::Number(inner.next_id));
            inner.next_id += 1;
            if let Ok(line) = serde_json::to_string(&exit_request) {
                if let Err(e) = inner.gateway.write_line(&line).await {
                    warn!(error = %e, "failed to send exit request");
                }
            }
        }
        inner.gateway.terminate().await;
        info!(command = ?self.command, "stdio transport shut down");
        Ok(())
    }
}
