//! GoTrue anonymous sign-in — one ephemeral identity per request.

use portico_core::{entity::AnonSession, error::PorticoError};
use serde::Deserialize;
use tracing::debug;

use crate::{rest_error, Supabase};

#[derive(Debug, Deserialize)]
struct SignupResponse {
    access_token: String,
    user: SignupUser,
}

#[derive(Debug, Deserialize)]
struct SignupUser {
    id: String,
}

impl Supabase {
    /// Mint a fresh anonymous session. The returned bearer token scopes
    /// all row access for this request; nothing is cached across requests.
    pub(crate) async fn signup_anon(&self) -> Result<AnonSession, PorticoError> {
        let url = format!("{}/auth/v1/signup", self.url);
        debug!("store: POST {url} (anonymous sign-in)");

        let resp = self
            .http
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| PorticoError::Store(format!("anonymous sign-in failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(rest_error("anonymous sign-in", resp).await);
        }

        let parsed: SignupResponse = resp
            .json()
            .await
            .map_err(|e| PorticoError::Store(format!("anonymous sign-in: bad response: {e}")))?;

        Ok(AnonSession {
            identity_id: parsed.user.id,
            access_token: parsed.access_token,
        })
    }
}
