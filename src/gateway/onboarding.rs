//! Onboarding sub-dialogue — one bounded model turn with exactly one
//! callable capability: committing the user's timezone.

use async_trait::async_trait;
use portico_core::{
    entity::Profile,
    error::PorticoError,
    event::{Inbound, OnboardingReply},
    tool::{Tool, ToolDef, ToolResult},
    traits::Store,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

use super::{dispatch::dispatch_metadata, Gateway, WebhookStatus};

const ONBOARDING_INSTRUCTIONS: &str = "You are completing a one-time setup step for a personal assistant: capturing the user's timezone.\n\
The user may send a city, a country, an IANA zone name, an abbreviation, or a raw offset.\n\
Rules:\n\
- Convert the input to a canonical UTC-offset string: 'UTC+2', 'UTC-4:30', 'UTC+0'. Use the standard (non-DST) offset unless the user says otherwise.\n\
- When you are confident, call the set_timezone tool with that string, then confirm to the user in one short sentence.\n\
- If the input is ambiguous (e.g. 'Portland', 'CST'), do not guess — ask one short clarifying question instead.\n\
- If the message is unrelated to timezones, explain that you need their timezone before you can help, and give an example like 'Lisbon' or 'UTC+1'.\n\
Keep replies to one or two sentences, plain text.";

const FALLBACK_TEXT: &str = "I couldn't save your timezone just now. Please send it once more in the form <b>UTC+2</b> or <b>UTC-4:30</b>.";

/// The single capability exposed to the onboarding model.
struct CommitTimezone {
    store: Arc<dyn Store>,
    profile_id: String,
}

#[async_trait]
impl Tool for CommitTimezone {
    fn def(&self) -> ToolDef {
        ToolDef {
            name: "set_timezone".to_string(),
            description: "Save the user's timezone as a canonical UTC-offset string, e.g. 'UTC+2' or 'UTC-4:30'. Call this once you are confident."
                .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "timezone": {
                        "type": "string",
                        "description": "Canonical UTC-offset string, e.g. 'UTC-5'",
                    }
                },
                "required": ["timezone"],
            }),
        }
    }

    async fn execute(&self, args: &Value) -> ToolResult {
        let Some(timezone) = args
            .get("timezone")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
        else {
            return ToolResult::error("missing 'timezone' argument");
        };

        match self.store.set_timezone(&self.profile_id, timezone).await {
            Ok(()) => {
                info!(
                    "timezone committed for profile {}: {timezone}",
                    self.profile_id
                );
                ToolResult::ok(format!("timezone saved as {timezone}"))
            }
            Err(e) => {
                error!("timezone commit failed for {}: {e}", self.profile_id);
                ToolResult::error(format!("could not save timezone: {e}"))
            }
        }
    }
}

impl Gateway {
    /// Run the onboarding turn. Infallible at the HTTP level: every outcome
    /// is a 200, because a 5xx here would make the platform redeliver and
    /// repeat the same model call.
    pub(super) async fn onboard(
        &self,
        event: &Inbound,
        profile: &Profile,
        prompt: &str,
    ) -> WebhookStatus {
        let tool: Arc<dyn Tool> = Arc::new(CommitTimezone {
            store: self.store.clone(),
            profile_id: profile.id.clone(),
        });

        let outcome: Result<(), PorticoError> = async {
            let final_response = self
                .provider
                .run_turn(
                    ONBOARDING_INSTRUCTIONS,
                    prompt,
                    std::slice::from_ref(&tool),
                    self.max_steps,
                )
                .await?;

            // The reply leaves via the delivery callback, not the primary
            // pipeline; this turn never falls through to dispatch.
            self.downstream
                .deliver_onboarding(&OnboardingReply {
                    final_response,
                    chat_id: event.chat_id().to_string(),
                    profile_id: profile.id.clone(),
                    metadata: dispatch_metadata(event),
                    timezone: None,
                    role: "user".to_string(),
                })
                .await?;

            Ok(())
        }
        .await;

        match outcome {
            Ok(()) => WebhookStatus::TimezoneSetupHandled,
            Err(e) => {
                error!("onboarding turn failed: {e}");
                if let Err(send_err) = self
                    .messenger
                    .send_text(event.chat_id(), FALLBACK_TEXT)
                    .await
                {
                    error!("onboarding fallback send failed: {send_err}");
                }
                WebhookStatus::TimezoneSetupError
            }
        }
    }
}
