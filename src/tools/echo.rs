use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::tool::{Tool, ToolError};

/// Returns its argument map unchanged. Useful for wiring checks.
pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echo the given arguments back to the caller"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "additionalProperties": true
        })
    }

    async fn call(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        Ok(json!({ "echo": Value::Object(arguments) }))
    }
}
