//! # portico-providers
//!
//! Language-model provider implementations for the portico onboarding turn.

pub mod anthropic;
pub mod openai;

use portico_core::tool::{Tool, ToolResult};
use serde_json::Value;
use std::sync::Arc;

/// Route a model tool call to the matching tool.
pub(crate) async fn execute_tool(tools: &[Arc<dyn Tool>], name: &str, args: &Value) -> ToolResult {
    match tools.iter().find(|t| t.def().name == name) {
        Some(tool) => tool.execute(args).await,
        None => ToolResult::error(format!("unknown tool: {name}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use portico_core::tool::ToolDef;

    struct Echo;

    #[async_trait]
    impl Tool for Echo {
        fn def(&self) -> ToolDef {
            ToolDef {
                name: "echo".into(),
                description: "Echo the input.".into(),
                parameters: serde_json::json!({"type": "object"}),
            }
        }

        async fn execute(&self, args: &Value) -> ToolResult {
            ToolResult::ok(args.to_string())
        }
    }

    #[tokio::test]
    async fn test_execute_tool_routes_by_name() {
        let tools: Vec<Arc<dyn Tool>> = vec![Arc::new(Echo)];
        let result = execute_tool(&tools, "echo", &serde_json::json!({"x": 1})).await;
        assert!(!result.is_error);
        assert_eq!(result.content, r#"{"x":1}"#);
    }

    #[tokio::test]
    async fn test_execute_tool_rejects_unknown_name() {
        let tools: Vec<Arc<dyn Tool>> = vec![Arc::new(Echo)];
        let result = execute_tool(&tools, "rm_rf", &Value::Null).await;
        assert!(result.is_error);
        assert!(result.content.contains("unknown tool"));
    }
}
