//! Request pipeline — policy gate, identity provisioning, and routing
//! between onboarding and steady-state dispatch.

use portico_core::{
    entity::{NewProfile, OnboardingState},
    event::Inbound,
    sanitize,
};
use tracing::{info, warn};

use super::{policy, Gateway, GatewayError, WebhookStatus};

impl Gateway {
    /// Process one accepted envelope end to end.
    ///
    /// Stateless: everything durable lives in the store, so a full
    /// redelivery of the same webhook is safe at any point of failure.
    pub async fn handle(&self, event: Inbound) -> Result<WebhookStatus, GatewayError> {
        let sender = event.sender().clone();
        let preview = if event.prompt().chars().count() > 60 {
            let truncated: String = event.prompt().chars().take(60).collect();
            format!("{truncated}...")
        } else {
            event.prompt().to_string()
        };
        info!(
            "[telegram] {} says: {preview}",
            sender.handle.as_deref().unwrap_or("unknown")
        );

        // --- 1. POLICY GATE ---
        if let Some(reason) = policy::deny_reason(&self.allowed_users, sender.handle.as_deref()) {
            warn!("policy denied sender {}: {reason}", sender.id);
            return Ok(WebhookStatus::UnauthorizedUser);
        }

        // --- 2. SANITIZE INPUT ---
        let sanitized = sanitize::sanitize(event.prompt());
        if sanitized.was_modified {
            warn!(
                "sanitized input from {}: {:?}",
                sender.id, sanitized.warnings
            );
        }
        let prompt = sanitized.text;

        // --- 3. EPHEMERAL IDENTITY ---
        let session = self.store.mint_session().await?;

        // --- 4. PROFILE ---
        let profile = match self.store.find_profile(sender.id).await? {
            None => {
                info!("new sender {} — creating profile", sender.id);
                self.store
                    .create_profile(&NewProfile {
                        auth_user_id: session.identity_id.clone(),
                        service_id: sender.id,
                        handle: sender.handle.clone(),
                        first_name: sender.first_name.clone(),
                        last_name: sender.last_name.clone(),
                        timezone: None,
                    })
                    .await?
            }
            Some(profile) => {
                // Auth is re-established per request; keep the profile
                // pointing at a currently valid identity.
                if profile.auth_user_id != session.identity_id {
                    self.store
                        .relink_identity(&profile.id, &session.identity_id)
                        .await?;
                }
                profile
            }
        };

        // --- 5. CHAT + MEMBERSHIP (scoped credential only) ---
        self.store
            .ensure_chat(&session, event.chat_id(), &profile.id)
            .await?;
        self.store
            .ensure_membership(&session, event.chat_id(), &profile.id)
            .await?;

        // --- 6. ROUTE ---
        match OnboardingState::of(&profile) {
            OnboardingState::AwaitingTimezone => {
                Ok(self.onboard(&event, &profile, &prompt).await)
            }
            OnboardingState::Ready => {
                self.dispatch(&event, &profile, prompt);
                Ok(WebhookStatus::Received)
            }
        }
    }
}
