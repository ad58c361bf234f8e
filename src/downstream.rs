//! HTTP delivery to the downstream processing service and the onboarding
//! delivery callback.

use async_trait::async_trait;
use portico_core::{
    config::DownstreamConfig,
    error::PorticoError,
    event::{OnboardingReply, ProcessRequest},
    traits::Downstream,
};
use serde::Serialize;
use tracing::debug;

/// Reqwest-backed downstream client. Both targets are invoked with the
/// privileged key; row scoping is the processor's concern.
pub struct HttpDownstream {
    client: reqwest::Client,
    processor_url: String,
    onboarding_url: String,
    service_key: String,
}

impl HttpDownstream {
    pub fn new(config: &DownstreamConfig, service_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            processor_url: config.processor_url.clone(),
            onboarding_url: config.onboarding_url.clone(),
            service_key: service_key.to_string(),
        }
    }

    async fn post_json<T: Serialize>(
        &self,
        url: &str,
        body: &T,
        context: &str,
    ) -> Result<(), PorticoError> {
        debug!("downstream: POST {url}");

        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.service_key)
            .json(body)
            .send()
            .await
            .map_err(|e| PorticoError::Dispatch(format!("{context} request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(PorticoError::Dispatch(format!(
                "{context} returned {status}: {text}"
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl Downstream for HttpDownstream {
    async fn dispatch(&self, request: &ProcessRequest) -> Result<(), PorticoError> {
        self.post_json(&self.processor_url, request, "processor").await
    }

    async fn deliver_onboarding(&self, reply: &OnboardingReply) -> Result<(), PorticoError> {
        self.post_json(&self.onboarding_url, reply, "onboarding delivery")
            .await
    }
}
