//! HTTP transport: one JSON-RPC envelope per POST to a fixed endpoint.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};
use url::Url;

use crate::protocol::{JsonRpcRequest, JsonRpcResponse};
use crate::transport::{into_send_result, Lifecycle, SendError, Transport, TransportError};

/// Default request path when the endpoint is given as host + port.
pub const DEFAULT_RPC_PATH: &str = "/jsonrpc";

/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Endpoint address: exactly one of a complete URL or a host/port pair
/// (with an optional path, defaulting to [`DEFAULT_RPC_PATH`]).
#[derive(Debug, Clone)]
pub enum HttpEndpoint {
    Url(String),
    HostPort {
        host: String,
        port: u16,
        path: String,
    },
}

impl HttpEndpoint {
    pub fn url(url: impl Into<String>) -> Self {
        HttpEndpoint::Url(url.into())
    }

    pub fn host_port(host: impl Into<String>, port: u16) -> Self {
        HttpEndpoint::HostPort {
            host: host.into(),
            port,
            path: DEFAULT_RPC_PATH.into(),
        }
    }

    pub fn host_port_path(host: impl Into<String>, port: u16, path: impl Into<String>) -> Self {
        HttpEndpoint::HostPort {
            host: host.into(),
            port,
            path: path.into(),
        }
    }

    fn resolve(&self) -> Result<Url, TransportError> {
        let raw = match self {
            HttpEndpoint::Url(url) => url.clone(),
            HttpEndpoint::HostPort { host, port, path } => {
                let path = if path.starts_with('/') {
                    path.clone()
                } else {
                    format!("/{path}")
                };
                format!("http://{host}:{port}{path}")
            }
        };
        Url::parse(&raw).map_err(|e| TransportError::HttpRequest(format!("invalid URL '{raw}': {e}")))
    }
}

/// Transport that serializes each request as a JSON POST body.
///
/// Relies on the HTTP connection for framing; the design still assumes one
/// in-flight call per instance at a time.
pub struct HttpTransport {
    url: Url,
    timeout: Duration,
    client: Option<reqwest::Client>,
    state: Lifecycle,
}

impl HttpTransport {
    pub fn new(endpoint: HttpEndpoint) -> Result<Self, TransportError> {
        Ok(Self {
            url: endpoint.resolve()?,
            timeout: DEFAULT_TIMEOUT,
            client: None,
            state: Lifecycle::Uninitialized,
        })
    }

    pub fn from_url(url: impl Into<String>) -> Result<Self, TransportError> {
        Self::new(HttpEndpoint::url(url))
    }

    pub fn from_host_port(host: impl Into<String>, port: u16) -> Result<Self, TransportError> {
        Self::new(HttpEndpoint::host_port(host, port))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolved endpoint URL.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn initialize(&mut self) -> Result<(), TransportError> {
        if self.state == Lifecycle::ShutDown {
            return Err(TransportError::ShutDown);
        }
        if self.client.is_none() {
            let client = reqwest::Client::builder()
                .timeout(self.timeout)
                .build()
                .map_err(|e| TransportError::HttpRequest(e.to_string()))?;
            self.client = Some(client);
        }
        self.state = Lifecycle::Initialized;
        info!(url = %self.url, "HTTP transport initialized");
        Ok(())
    }

    async fn send(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse, SendError> {
        let client = self
            .client
            .as_ref()
            .ok_or(TransportError::NotInitialized("HTTP client not created"))?;

        debug!(url = %self.url, method = %request.method, "sending HTTP request");
        let response = client
            .post(self.url.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| TransportError::HttpRequest(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::HttpRequest(e.to_string()))?;

        if !status.is_success() {
            return Err(TransportError::HttpStatus {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let decoded: JsonRpcResponse = serde_json::from_str(&body)
            .map_err(|e| TransportError::InvalidBody(e.to_string()))?;
        into_send_result(decoded)
    }

    async fn shutdown(&mut self) -> Result<(), TransportError> {
        // No-op unless resources were actually acquired.
        if self.state == Lifecycle::Initialized {
            self.client = None;
            self.state = Lifecycle::ShutDown;
            info!(url = %self.url, "HTTP transport shut down");
        }
        Ok(())
    }
}
