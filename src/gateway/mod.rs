//! Gateway — the webhook-driven pipeline connecting the chat platform,
//! the backend store, the onboarding model, and the downstream processor.

mod dispatch;
mod onboarding;
mod pipeline;
mod policy;

#[cfg(test)]
pub(crate) mod mocks;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use portico_core::{
    config::Config,
    error::PorticoError,
    traits::{Downstream, Messenger, Provider, Store},
};
use serde::Serialize;
use std::sync::Arc;
use tracing::error;

/// The body of every HTTP 200 response: `{"status": ...}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookStatus {
    /// Accepted and handed to the downstream processor.
    Received,
    /// Structurally valid but nothing to process.
    ReceivedNotProcessed,
    /// Sender not on the allow-list. Deliberately a 200 so the platform
    /// does not retry and denial looks like any other soft no-op.
    UnauthorizedUser,
    /// Onboarding turn ran; reply went out via the delivery callback.
    TimezoneSetupHandled,
    /// Onboarding turn failed; user got a direct clarification prompt.
    TimezoneSetupError,
}

/// Request-level failures and their HTTP mapping.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// No shared secret configured on this deployment — fail closed.
    #[error("webhook secret is not configured")]
    SecretUnconfigured,
    /// Secret header missing or mismatched; one response for both.
    #[error("forbidden")]
    Forbidden,
    /// Envelope failed structural validation.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    /// Identity/profile/chat provisioning failed; the platform's webhook
    /// redelivery is the retry mechanism.
    #[error("provisioning failed: {0}")]
    Provisioning(#[from] PorticoError),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, msg) = match &self {
            GatewayError::SecretUnconfigured => {
                error!("refusing webhook traffic: no shared secret configured");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "service unavailable".to_string(),
                )
            }
            GatewayError::Forbidden => (StatusCode::FORBIDDEN, "forbidden".to_string()),
            GatewayError::MalformedPayload(m) => {
                (StatusCode::BAD_REQUEST, format!("malformed payload: {m}"))
            }
            GatewayError::Provisioning(e) => {
                error!(error = %e, "provisioning failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                )
            }
        };
        (status, axum::Json(serde_json::json!({ "error": msg }))).into_response()
    }
}

/// The central gateway; one stateless `handle` per webhook delivery.
pub struct Gateway {
    pub(crate) store: Arc<dyn Store>,
    pub(crate) provider: Arc<dyn Provider>,
    pub(crate) messenger: Arc<dyn Messenger>,
    pub(crate) downstream: Arc<dyn Downstream>,
    pub(crate) webhook_secret: Option<String>,
    pub(crate) allowed_users: Vec<String>,
    pub(crate) max_steps: u32,
}

impl Gateway {
    /// Create a new gateway.
    pub fn new(
        store: Arc<dyn Store>,
        provider: Arc<dyn Provider>,
        messenger: Arc<dyn Messenger>,
        downstream: Arc<dyn Downstream>,
        config: &Config,
    ) -> Self {
        Self {
            store,
            provider,
            messenger,
            downstream,
            webhook_secret: config.telegram.webhook_secret.clone(),
            allowed_users: config.telegram.allowed_users.clone(),
            max_steps: config.provider.max_steps,
        }
    }
}
