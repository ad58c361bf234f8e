//! OpenAI-compatible API provider.
//!
//! Works with OpenAI's API and any compatible endpoint. Runs the bounded
//! onboarding turn via chat completions with function tools.

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

/// OpenAI-compatible provider.
pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiProvider {
    /// Create from config values.
    pub fn from_config(base_url: String, api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
            model,
        }
    }
}

#[derive(Serialize, Deserialize, Clone)]
pub(crate) struct ChatMessage {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<OpenAiToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

#[derive(Serialize)]
pub(crate) struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<OpenAiTool>>,
}

#[derive(Serialize, Clone)]
pub(crate) struct OpenAiTool {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: OpenAiFunctionDef,
}

#[derive(Serialize, Clone)]
pub(crate) struct OpenAiFunctionDef {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Serialize, Deserialize, Clone)]
pub(crate) struct OpenAiToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub function: OpenAiFunctionCall,
}

/// Arguments arrive as a JSON-encoded string, not an object.
#[derive(Serialize, Deserialize, Clone)]
pub(crate) struct OpenAiFunctionCall {
    pub name: String,
    pub arguments: String,
}

#[derive(Deserialize)]
pub(crate) struct ChatCompletionResponse {
    pub choices: Option<Vec<ChatChoice>>,
}

#[derive(Deserialize)]
pub(crate) struct ChatChoice {
    pub message: Option<ChatMessage>,
}

/// Convert a provider-agnostic ToolDef to OpenAI's function format.
pub(crate) fn to_openai_tool(def: &ToolDef) -> OpenAiTool {
    OpenAiTool {
        kind: "function".to_string(),
        function: OpenAiFunctionDef {
            name: def.name.clone(),
            description: def.description.clone(),
            parameters: def.parameters.clone(),
        },
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
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
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));

        let tool_defs: Vec<OpenAiTool> = tools.iter().map(|t| to_openai_tool(&t.def())).collect();
        let mut messages = vec![
            ChatMessage {
                role: "system".to_string(),
                content: Some(instructions.to_string()),
                tool_calls: None,
                tool_call_id: None,
            },
            ChatMessage {
                role: "user".to_string(),
                content: Some(prompt.to_string()),
                tool_calls: None,
                tool_call_id: None,
            },
        ];

        for step in 0..max_steps {
            let body = ChatCompletionRequest {
                model: self.model.clone(),
                messages: messages.clone(),
                tools: if tool_defs.is_empty() {
                    None
                } else {
                    Some(tool_defs.clone())
                },
            };

            debug!("openai: POST {url} model={} step={step}", self.model);

            let resp = self
                .client
                .post(&url)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .json(&body)
                .send()
                .await
                .map_err(|e| PorticoError::Provider(format!("openai request failed: {e}")))?;

            if !resp.status().is_success() {
                let status = resp.status();
                let text = resp.text().await.unwrap_or_default();
                return Err(PorticoError::Provider(format!(
                    "openai returned {status}: {text}"
                )));
            }

            let parsed: ChatCompletionResponse = resp.json().await.map_err(|e| {
                PorticoError::Provider(format!("openai: failed to parse response: {e}"))
            })?;

            let Some(assistant_msg) = parsed
                .choices
                .and_then(|mut c| (!c.is_empty()).then(|| c.remove(0)))
                .and_then(|c| c.message)
            else {
                break;
            };

            // Tool calls first; text only when the model is done.
            if let Some(calls) = assistant_msg.tool_calls.clone().filter(|c| !c.is_empty()) {
                messages.push(assistant_msg);

                for call in &calls {
                    info!("openai: tool call [{step}] {}", call.function.name);

                    let args: Value = match serde_json::from_str(&call.function.arguments) {
                        Ok(v) => v,
                        Err(e) => {
                            warn!("openai: unparseable tool arguments: {e}");
                            Value::Null
                        }
                    };
                    let result = crate::execute_tool(tools, &call.function.name, &args).await;

                    messages.push(ChatMessage {
                        role: "tool".to_string(),
                        content: Some(result.content),
                        tool_calls: None,
                        tool_call_id: Some(call.id.clone()),
                    });
                }

                continue;
            }

            match assistant_msg.content {
                Some(text) if !text.is_empty() => return Ok(text),
                _ => break,
            }
        }

        Err(PorticoError::Provider(format!(
            "openai: no final response within {max_steps} steps"
        )))
    }

    async fn is_available(&self) -> bool {
        if self.api_key.is_empty() {
            warn!("openai: no API key configured");
            return false;
        }
        // Basic check: try to list models.
        let url = format!("{}/models", self.base_url.trim_end_matches('/'));
        match self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                warn!("openai not available: {e}");
                false
            }
        }
    }
}
