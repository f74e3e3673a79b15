//! Transport capability: a channel over which JSON-RPC requests and
//! responses are exchanged with a single remote endpoint.
//!
//! Two variants ship: [`HttpTransport`] (POST to a fixed URL) and
//! [`StdioTransport`] (newline-delimited exchange with a child process).
//! Errors split into two kinds so callers can tell "the channel itself
//! failed" ([`TransportError`]) from "the channel works but the remote call
//! failed" ([`SendError::Rpc`]).

pub mod http;
pub mod stdio;

pub use http::{HttpEndpoint, HttpTransport};
pub use stdio::StdioTransport;

use async_trait::async_trait;

use crate::protocol::{JsonRpcRequest, JsonRpcResponse};

/// Channel-level failure: the request never completed a round trip.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("transport not initialized: {0}")]
    NotInitialized(&'static str),

    #[error("transport already shut down")]
    ShutDown,

    #[error("failed to start subprocess: {0}")]
    Spawn(String),

    #[error("HTTP error: {status} - {body}")]
    HttpStatus { status: u16, body: String },

    #[error("HTTP request failed: {0}")]
    HttpRequest(String),

    #[error("invalid response body: {0}")]
    InvalidBody(String),

    #[error("subprocess not running or pipes unavailable: {0}")]
    ProcessUnavailable(String),

    #[error("no response from subprocess: {detail}")]
    EndOfStream { detail: String },

    #[error("broken pipe with subprocess ({exit}); stderr: {stderr}")]
    BrokenPipe { exit: String, stderr: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure surfaced by [`Transport::send`].
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// The channel itself failed; no well-formed response was obtained.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The round trip succeeded but the response carried an `error` member.
    #[error("JSON-RPC error {code}: {message}")]
    Rpc {
        code: i64,
        message: String,
        data: Option<serde_json::Value>,
    },
}

/// Lifecycle: Uninitialized → Initialized → ShutDown (terminal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lifecycle {
    Uninitialized,
    Initialized,
    ShutDown,
}

/// A request/response channel to one tool-hosting endpoint.
///
/// `send` is only valid after `initialize`; `shutdown` is idempotent and a
/// no-op on an uninitialized transport. Each instance serializes its own
/// traffic; ownership belongs to a single logical caller.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Acquire the underlying resources (HTTP client, child process).
    async fn initialize(&mut self) -> Result<(), TransportError>;

    /// Send one request and block until its response arrives.
    async fn send(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse, SendError>;

    /// Release the underlying resources, best-effort.
    async fn shutdown(&mut self) -> Result<(), TransportError>;
}

/// Promote a response-level `error` member into [`SendError::Rpc`].
pub(crate) fn into_send_result(resp: JsonRpcResponse) -> Result<JsonRpcResponse, SendError> {
    if let Some(err) = resp.error {
        return Err(SendError::Rpc {
            code: err.code,
            message: err.message,
            data: err.data,
        });
    }
    Ok(resp)
}
