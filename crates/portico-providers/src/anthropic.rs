//! Anthropic API provider.
//!
//! Calls the Anthropic Messages API directly; the onboarding turn runs as
//! a bounded tool_use loop.

use async_trait::async_trait;
use portico_core::{
    error::PorticoError,
    tool::{Tool, ToolDef},
    traits::Provider,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// Onboarding replies are short; no need for a large completion budget.
const MAX_TOKENS: u32 = 1024;

/// Anthropic Messages API provider.
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl AnthropicProvider {
    /// Create from config values.
    pub fn from_config(api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
        }
    }
}

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "String::is_empty")]
    system: String,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<AnthropicToolDef>>,
}

#[derive(Serialize, Clone)]
struct AnthropicToolDef {
    name: String,
    description: String,
    input_schema: Value,
}

#[derive(Serialize, Deserialize, Clone)]
struct AnthropicMessage {
    role: String,
    content: Vec<ContentBlock>,
}

#[derive(Serialize, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default)]
        is_error: bool,
    },
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Option<Vec<ContentBlock>>,
    stop_reason: Option<String>,
}

fn to_anthropic_tool(def: &ToolDef) -> AnthropicToolDef {
    AnthropicToolDef {
        name: def.name.clone(),
        description: def.description.clone(),
        input_schema: def.parameters.clone(),
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn requires_api_key(&self) -> bool {
        true
    }

    async fn run_turn(
        &self,
        instructions: &str,
        prompt: &str,
        tools: &[Arc<dyn Tool>],
        max_steps: u32,
    ) -> Result<String, PorticoError> {
        let tool_defs: Vec<AnthropicToolDef> =
            tools.iter().map(|t| to_anthropic_tool(&t.def())).collect();

        let mut messages = vec![AnthropicMessage {
            role: "user".to_string(),
            content: vec![ContentBlock::Text {
                text: prompt.to_string(),
            }],
        }];

        for step in 0..max_steps {
            let body = MessagesRequest {
                model: self.model.clone(),
                max_tokens: MAX_TOKENS,
                system: instructions.to_string(),
                messages: messages.clone(),
                tools: if tool_defs.is_empty() {
                    None
                } else {
                    Some(tool_defs.clone())
                },
            };

            debug!("anthropic: POST {ANTHROPIC_API_URL} model={} step={step}", self.model);

            let resp = self
                .client
                .post(ANTHROPIC_API_URL)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("content-type", "application/json")
                .json(&body)
                .send()
                .await
                .map_err(|e| PorticoError::Provider(format!("anthropic request failed: {e}")))?;

            if !resp.status().is_success() {
                let status = resp.status();
                let text = resp.text().await.unwrap_or_default();
                return Err(PorticoError::Provider(format!(
                    "anthropic returned {status}: {text}"
                )));
            }

            let parsed: MessagesResponse = resp.json().await.map_err(|e| {
                PorticoError::Provider(format!("anthropic: failed to parse response: {e}"))
            })?;

            let blocks = parsed.content.unwrap_or_default();

            if parsed.stop_reason.as_deref() == Some("tool_use") {
                let mut results = Vec::new();
                for block in &blocks {
                    if let ContentBlock::ToolUse { id, name, input } = block {
                        info!("anthropic: tool call [{step}] {name}");
                        let result = crate::execute_tool(tools, name, input).await;
                        results.push(ContentBlock::ToolResult {
                            tool_use_id: id.clone(),
                            content: result.content,
                            is_error: result.is_error,
                        });
                    }
                }

                messages.push(AnthropicMessage {
                    role: "assistant".to_string(),
                    content: blocks,
                });
                messages.push(AnthropicMessage {
                    role: "user".to_string(),
                    content: results,
                });

                continue;
            }

            let text: Vec<&str> = blocks
                .iter()
                .filter_map(|b| match b {
                    ContentBlock::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect();
            if !text.is_empty() {
                return Ok(text.join("\n"));
            }
            break;
        }

        Err(PorticoError::Provider(format!(
            "anthropic: no final response within {max_steps} steps"
        )))
    }

    async fn is_available(&self) -> bool {
        if self.api_key.is_empty() {
            warn!("anthropic: no API key configured");
            return false;
        }
        // No lightweight health endpoint; we trust the key is valid.
        true
    }
}
