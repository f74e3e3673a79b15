//! Multi-transport client: aggregates tool catalogs from an ordered list of
//! transports and routes each call to the transport that registered the tool.

use std::collections::{BTreeMap, HashMap};

use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::protocol::{JsonRpcRequest, RpcId};
use crate::tool::ToolDescriptor;
use crate::transport::{SendError, Transport, TransportError};

/// Request id prefix for discovery calls during [`McpClient::connect`];
/// the page number (from 1) is appended.
const TOOLS_LIST_REQUEST_ID_PREFIX: &str = "client_tools_list_";

/// Client-side failure taxonomy.
///
/// `Transport` and `Rpc` re-raise the corresponding [`SendError`] kinds
/// unchanged; `ToolExecution` is the third, application-level kind for a
/// successful round trip whose payload was marked `isError`.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("at least one transport must be provided")]
    NoTransports,

    #[error("tool '{name}' not found. Available tools: {available:?}")]
    UnknownTool {
        name: String,
        available: Vec<String>,
    },

    #[error("tool '{name}' reported an execution error: {message}")]
    ToolExecution {
        name: String,
        message: String,
        /// Full result payload, kept for inspection.
        payload: Value,
    },

    #[error("malformed response for tool '{name}': {reason}")]
    MalformedResponse { name: String, reason: String },

    #[error(transparent)]
    Transport(TransportError),

    #[error("JSON-RPC error {code}: {message}")]
    Rpc {
        code: i64,
        message: String,
        data: Option<Value>,
    },
}

impl From<SendError> for ClientError {
    fn from(err: SendError) -> Self {
        match err {
            SendError::Transport(e) => ClientError::Transport(e),
            SendError::Rpc { code, message, data } => ClientError::Rpc { code, message, data },
        }
    }
}

struct RegisteredTool {
    descriptor: ToolDescriptor,
    /// Index of the owning transport in the configured order.
    transport: usize,
}

/// Name-keyed tool catalog built once during discovery, immutable afterward.
///
/// Invariant: the routing entry and the descriptor for a name always exist
/// together; at most one transport owns a given name (first-wins).
#[derive(Default)]
pub struct ToolRegistry {
    entries: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Register a descriptor; duplicates of an already-seen name are dropped,
    /// never overwriting. Returns whether the descriptor was kept.
    fn insert(&mut self, descriptor: ToolDescriptor, transport: usize) -> bool {
        if self.index.contains_key(&descriptor.name) {
            return false;
        }
        self.index.insert(descriptor.name.clone(), self.entries.len());
        self.entries.push(RegisteredTool { descriptor, transport });
        true
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|&i| &self.entries[i].descriptor)
    }

    fn route(&self, name: &str) -> Option<usize> {
        self.index.get(name).map(|&i| self.entries[i].transport)
    }

    /// Tool names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.descriptor.name.clone()).collect()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.entries.iter().map(|e| &e.descriptor)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Client over one or more transports with a unified tool surface.
pub struct McpClient {
    transports: Vec<Box<dyn Transport>>,
    registry: ToolRegistry,
}

impl McpClient {
    /// Initialize every transport in order and discover its tools.
    ///
    /// An empty transport list is a configuration error. A transport that
    /// fails initialization or discovery is logged and skipped; it
    /// contributes zero tools and the client stays usable with the rest.
    pub async fn connect(mut transports: Vec<Box<dyn Transport>>) -> Result<Self, ClientError> {
        if transports.is_empty() {
            return Err(ClientError::NoTransports);
        }

        let mut registry = ToolRegistry::default();
        for (idx, transport) in transports.iter_mut().enumerate() {
            if let Err(e) = transport.initialize().await {
                warn!(transport = idx, error = %e, "transport initialization failed, skipping");
                continue;
            }

            // Paginated servers hand out the catalog in pages; follow
            // `nextCursor` until it disappears so none of them is truncated.
            let mut cursor: Option<String> = None;
            let mut page = 0usize;
            let mut discovered = 0usize;
            loop {
                page += 1;
                let params = match &cursor {
                    Some(c) => json!({ "cursor": c }),
                    None => json!({}),
                };
                let request = JsonRpcRequest::new("tools/list")
                    .with_params(params)
                    .with_id(RpcId::Str(format!("{TOOLS_LIST_REQUEST_ID_PREFIX}{page}")));
                let response = match transport.send(request).await {
                    Ok(r) => r,
                    Err(e) => {
                        warn!(transport = idx, page, error = %e, "tool discovery failed");
                        break;
                    }
                };

                let tools = response
                    .result
                    .as_ref()
                    .and_then(|r| r.get("tools"))
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default();
                discovered += tools.len();

                for raw in tools {
                    match serde_json::from_value::<ToolDescriptor>(raw) {
                        Ok(descriptor) => {
                            let name = descriptor.name.clone();
                            if registry.insert(descriptor, idx) {
                                debug!(transport = idx, tool = %name, "registered tool");
                            } else {
                                debug!(transport = idx, tool = %name, "duplicate tool name dropped");
                            }
                        }
                        Err(e) => {
                            warn!(transport = idx, error = %e, "invalid tool descriptor, skipping");
                        }
                    }
                }

                let next = response
                    .result
                    .as_ref()
                    .and_then(|r| r.get("nextCursor"))
                    .and_then(Value::as_str)
                    .map(str::to_string);
                match next {
                    Some(n) if Some(&n) == cursor.as_ref() => {
                        warn!(transport = idx, cursor = %n, "cursor did not advance, stopping discovery");
                        break;
                    }
                    Some(n) => cursor = Some(n),
                    None => break,
                }
            }
            info!(transport = idx, count = discovered, pages = page, "discovered tools");
        }

        info!(total = registry.len(), "tool discovery complete");
        Ok(Self { transports, registry })
    }

    /// Snapshot of every registered tool descriptor, in registration order.
    pub fn list_tools(&self) -> Vec<ToolDescriptor> {
        self.registry.descriptors().cloned().collect()
    }

    /// Descriptor for `name` under first-wins discovery, if registered.
    pub fn get_tool_schema(&self, name: &str) -> Option<&ToolDescriptor> {
        self.registry.get(name)
    }

    /// The immutable registry built during [`McpClient::connect`].
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Call `name` on the transport that registered it.
    ///
    /// Returns the result payload (typically `{"content": [...], ...}`).
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<Value, ClientError> {
        let transport_idx = self.registry.route(name).ok_or_else(|| {
            warn!(tool = name, "tool not found");
            ClientError::UnknownTool {
                name: name.to_string(),
                available: self.registry.names(),
            }
        })?;

        let request = JsonRpcRequest::new("tools/call")
            .with_params(json!({ "name": name, "arguments": Value::Object(arguments.clone()) }))
            .with_id(RpcId::Str(call_request_id(name, &arguments)));

        debug!(tool = name, transport = transport_idx, "calling tool");
        let response = self.transports[transport_idx].send(request).await?;

        let payload = response.result.ok_or_else(|| ClientError::MalformedResponse {
            name: name.to_string(),
            reason: "response carried neither result nor error".into(),
        })?;

        if payload.get("isError").and_then(Value::as_bool).unwrap_or(false) {
            let message = payload
                .get("content")
                .and_then(Value::as_array)
                .and_then(|c| c.first())
                .and_then(|c| c.get("text"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| {
                    format!("Tool '{name}' execution reported an error on the server")
                });
            warn!(tool = name, %message, "tool reported an execution error");
            return Err(ClientError::ToolExecution {
                name: name.to_string(),
                message,
                payload,
            });
        }

        Ok(payload)
    }

    /// Bound handle for `name`, the call-by-name convenience surface.
    pub fn tool(&self, name: &str) -> Result<ToolHandle<'_>, ClientError> {
        let descriptor = self.registry.get(name).ok_or_else(|| ClientError::UnknownTool {
            name: name.to_string(),
            available: self.registry.names(),
        })?;
        Ok(ToolHandle {
            client: self,
            name: name.to_string(),
            descriptor,
        })
    }

    /// Shut down every managed transport, continuing past individual
    /// failures.
    pub async fn shutdown(&mut self) {
        info!("shutting down client transports");
        for (idx, transport) in self.transports.iter_mut().enumerate() {
            if let Err(e) = transport.shutdown().await {
                warn!(transport = idx, error = %e, "transport shutdown failed");
            }
        }
    }
}

/// A tool name bound to the client that discovered it, holding the
/// descriptor looked up at construction.
pub struct ToolHandle<'a> {
    client: &'a McpClient,
    name: String,
    descriptor: &'a ToolDescriptor,
}

impl ToolHandle<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> &ToolDescriptor {
        self.descriptor
    }

    pub async fn call(&self, arguments: Map<String, Value>) -> Result<Value, ClientError> {
        self.client.call_tool(&self.name, arguments).await
    }
}

/// Reproducible request id for a tool call: derived from the tool name and a
/// digest of the canonicalized argument map.
fn call_request_id(name: &str, arguments: &Map<String, Value>) -> String {
    if arguments.is_empty() {
        return format!("call_{name}_noargs");
    }
    let canonical: BTreeMap<&String, &Value> = arguments.iter().collect();
    let encoded = serde_json::to_string(&canonical).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(encoded.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("call_{name}_{}", &digest[..12])
}
