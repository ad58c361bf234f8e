//! Tool-call types shared between the gateway (which implements tools)
//! and providers (which hand them to the model).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool definition in provider-agnostic format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDef {
    /// Tool name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema for parameters.
    pub parameters: Value,
}

/// Result of executing a tool.
#[derive(Debug, Clone)]
pub struct ToolResult {
    /// Text output reported back to the model.
    pub content: String,
    /// Whether the tool call failed.
    pub is_error: bool,
}

impl ToolResult {
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }
}

/// A capability callable by the model during a provider turn.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The definition advertised to the model.
    fn def(&self) -> ToolDef;

    /// Execute with the model-supplied arguments.
    async fn execute(&self, args: &Value) -> ToolResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_result_constructors() {
        let ok = ToolResult::ok("saved");
        assert!(!ok.is_error);
        assert_eq!(ok.content, "saved");

        let err = ToolResult::error("no such row");
        assert!(err.is_error);
    }

    #[test]
    fn test_tool_def_serializes_schema() {
        let def = ToolDef {
            name: "set_timezone".into(),
            description: "Save the user's timezone.".into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": { "timezone": { "type": "string" } },
                "required": ["timezone"],
            }),
        };
        let json = serde_json::to_value(&def).unwrap();
        assert_eq!(json["name"], "set_timezone");
        assert_eq!(json["parameters"]["required"][0], "timezone");
    }
}
