//! Steady-state dispatch — accept-and-forget handoff to the processing
//! service.

use portico_core::{
    entity::Profile,
    event::{DispatchMetadata, Inbound, ProcessRequest},
};
use tracing::error;

use super::Gateway;

/// Sender metadata carried on every downstream payload.
pub(super) fn dispatch_metadata(event: &Inbound) -> DispatchMetadata {
    let sender = event.sender();
    DispatchMetadata {
        platform: "telegram".to_string(),
        external_user_id: sender.id,
        handle: sender.handle.clone(),
        chat_id: event.chat_id().to_string(),
    }
}

impl Gateway {
    /// Hand the prompt to the processing service without waiting on it.
    /// Once the platform has its acknowledgment, failures here are
    /// unobservable to the caller — they go to the log only.
    pub(super) fn dispatch(&self, event: &Inbound, profile: &Profile, prompt: String) {
        let request = ProcessRequest {
            prompt,
            chat_id: event.chat_id().to_string(),
            profile_id: profile.id.clone(),
            metadata: dispatch_metadata(event),
            // The processor reads the committed timezone from the profile;
            // the payload field travels as null.
            timezone: None,
            role: "user".to_string(),
        };

        let downstream = self.downstream.clone();
        tokio::spawn(async move {
            if let Err(e) = downstream.dispatch(&request).await {
                error!("downstream dispatch failed: {e}");
            }
        });
    }
}
