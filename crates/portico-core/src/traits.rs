use crate::{
    entity::{AnonSession, NewProfile, Profile},
    error::PorticoError,
    event::{OnboardingReply, ProcessRequest},
    tool::Tool,
};
use async_trait::async_trait;
use std::sync::Arc;

/// AI provider trait — runs the bounded onboarding turn.
///
/// Every language-model backend (OpenAI, Anthropic, etc.) implements this
/// trait to provide a uniform tool-calling interface.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Human-readable provider name.
    fn name(&self) -> &str;

    /// Whether this provider requires an API key to function.
    fn requires_api_key(&self) -> bool;

    /// Run a tool-calling turn capped at `max_steps` model round-trips and
    /// return the model's final natural-language text.
    async fn run_turn(
        &self,
        instructions: &str,
        prompt: &str,
        tools: &[Arc<dyn Tool>],
        max_steps: u32,
    ) -> Result<String, PorticoError>;

    /// Check if the provider is available and ready.
    async fn is_available(&self) -> bool;
}

/// Outbound messaging seam to the chat platform.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Human-readable platform name.
    fn name(&self) -> &str;

    /// Send a text message to a chat.
    async fn send_text(&self, chat_id: &str, text: &str) -> Result<(), PorticoError>;

    /// Acknowledge an interactive callback.
    async fn answer_callback(&self, callback_id: &str) -> Result<(), PorticoError>;
}

/// Backend store seam.
///
/// Privileged operations cross the row-level isolation boundary and take no
/// session argument; scoped operations stay inside one user's partition and
/// require the session minted for the current request. The two paths must
/// never be swapped.
#[async_trait]
pub trait Store: Send + Sync {
    /// Mint a fresh anonymous session (ephemeral identity + bearer token)
    /// for a single request.
    async fn mint_session(&self) -> Result<AnonSession, PorticoError>;

    /// Privileged: look up a profile by platform user id.
    async fn find_profile(&self, service_id: i64) -> Result<Option<Profile>, PorticoError>;

    /// Privileged: insert a profile for a first-ever sender.
    async fn create_profile(&self, new: &NewProfile) -> Result<Profile, PorticoError>;

    /// Privileged: re-point a profile at the identity minted this request.
    async fn relink_identity(
        &self,
        profile_id: &str,
        auth_user_id: &str,
    ) -> Result<(), PorticoError>;

    /// Privileged: commit the onboarding timezone.
    async fn set_timezone(&self, profile_id: &str, timezone: &str) -> Result<(), PorticoError>;

    /// Scoped: create the chat row if absent; duplicates are success.
    async fn ensure_chat(
        &self,
        session: &AnonSession,
        chat_id: &str,
        profile_id: &str,
    ) -> Result<(), PorticoError>;

    /// Scoped: upsert the (chat, profile) membership pair.
    async fn ensure_membership(
        &self,
        session: &AnonSession,
        chat_id: &str,
        profile_id: &str,
    ) -> Result<(), PorticoError>;
}

/// Downstream delivery seam — the processing pipeline and the onboarding
/// delivery callback.
#[async_trait]
pub trait Downstream: Send + Sync {
    /// Hand a prompt to the processing service.
    async fn dispatch(&self, request: &ProcessRequest) -> Result<(), PorticoError>;

    /// Post a finished onboarding reply to the delivery callback.
    async fn deliver_onboarding(&self, reply: &OnboardingReply) -> Result<(), PorticoError>;
}
