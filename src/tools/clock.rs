use async_trait::async_trait;
use chrono::format::{Item, StrftimeItems};
use chrono::Utc;
use serde_json::{json, Map, Value};

use crate::tool::{Tool, ToolError};

/// Reports the current UTC time, optionally through a strftime format.
pub struct ClockTool;

#[async_trait]
impl Tool for ClockTool {
    fn name(&self) -> &str {
        "current_datetime"
    }

    fn description(&self) -> &str {
        "Get the current date and time in UTC"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "format": {
                    "type": "string",
                    "description": "strftime format string, defaults to RFC 3339"
                }
            }
        })
    }

    async fn call(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        let now = Utc::now();
        let rendered = match arguments.get("format").and_then(Value::as_str) {
            Some(format) => {
                let items: Vec<Item<'_>> = StrftimeItems::new(format).collect();
                if items.iter().any(|i| matches!(i, Item::Error)) {
                    return Err(ToolError::new(format!("invalid format string: {format}")));
                }
                now.format_with_items(items.into_iter()).to_string()
            }
            None => now.to_rfc3339(),
        };
        Ok(json!({ "datetime": rendered }))
    }
}
