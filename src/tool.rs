use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Failure raised by a tool implementation.
///
/// Converted by the dispatcher into an `isError: true` result payload, never
/// into a protocol-level error.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ToolError {
    pub message: String,
}

impl ToolError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Read-only description of a tool as surfaced by `tools/list`.
///
/// `name` is the collision key: a client aggregating several endpoints keeps
/// the first descriptor it sees for a given name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "inputSchema", default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
}

/// A named, schema-described unit of server-side functionality.
///
/// Implementations own whatever state they need; this crate only ever calls
/// through this trait and never persists anything on their behalf.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON-schema-shaped descriptor of the accepted argument map.
    fn input_schema(&self) -> Value;

    /// Invoke the tool with named arguments, returning a JSON-serializable
    /// result.
    async fn call(&self, arguments: Map<String, Value>) -> Result<Value, ToolError>;

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: Some(self.input_schema()),
        }
    }
}
