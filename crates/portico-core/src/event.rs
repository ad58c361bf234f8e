//! Normalized inbound events and downstream payload shapes.

use serde::{Deserialize, Serialize};

/// Identity as known to the chat platform. Arrives fresh on every event
/// and is never persisted as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sender {
    pub id: i64,
    pub handle: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// A platform envelope normalized to what the pipeline needs.
#[derive(Debug, Clone)]
pub enum Inbound {
    /// A plain text message.
    Message {
        prompt: String,
        sender: Sender,
        chat_id: String,
    },
    /// An interactive callback. `callback_id` must be acknowledged on
    /// receipt, before any provisioning work.
    Callback {
        callback_id: String,
        prompt: String,
        sender: Sender,
        chat_id: String,
    },
}

impl Inbound {
    pub fn prompt(&self) -> &str {
        match self {
            Self::Message { prompt, .. } | Self::Callback { prompt, .. } => prompt,
        }
    }

    pub fn sender(&self) -> &Sender {
        match self {
            Self::Message { sender, .. } | Self::Callback { sender, .. } => sender,
        }
    }

    pub fn chat_id(&self) -> &str {
        match self {
            Self::Message { chat_id, .. } | Self::Callback { chat_id, .. } => chat_id,
        }
    }

    pub fn callback_id(&self) -> Option<&str> {
        match self {
            Self::Message { .. } => None,
            Self::Callback { callback_id, .. } => Some(callback_id),
        }
    }
}

/// Sender metadata forwarded with every downstream payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchMetadata {
    pub platform: String,
    pub external_user_id: i64,
    pub handle: Option<String>,
    pub chat_id: String,
}

/// Request handed to the downstream processing service. Fire-and-forget:
/// the webhook response does not wait on its outcome.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    pub prompt: String,
    pub chat_id: String,
    pub profile_id: String,
    pub metadata: DispatchMetadata,
    pub timezone: Option<String>,
    pub role: String,
}

/// A pre-formed reply posted to the onboarding delivery callback after the
/// onboarding turn — carries a finished response, not a prompt to process.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingReply {
    pub final_response: String,
    pub chat_id: String,
    pub profile_id: String,
    pub metadata: DispatchMetadata,
    pub timezone: Option<String>,
    pub role: String,
}
