//! # portico-store
//!
//! Supabase backend access for the portico gateway: GoTrue anonymous
//! session minting and PostgREST row access.
//!
//! Two credential paths, never swapped: the privileged service key is used
//! only for profile reads/writes and the timezone commit; chat and
//! membership writes ride the per-request scoped bearer so row-level
//! isolation applies.

mod auth;
mod chats;
mod profiles;

use async_trait::async_trait;
use portico_core::{
    config::StoreConfig,
    entity::{AnonSession, NewProfile, Profile},
    error::PorticoError,
    traits::Store,
};

/// Supabase client over GoTrue + PostgREST.
pub struct Supabase {
    http: reqwest::Client,
    url: String,
    service_key: String,
    anon_key: String,
}

impl Supabase {
    /// Create a client from config values.
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: config.url.trim_end_matches('/').to_string(),
            service_key: config.service_key.clone(),
            anon_key: config.anon_key.clone(),
        }
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.url)
    }

    /// Privileged access — bypasses row-level isolation. Profiles only.
    fn privileged(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    /// Scoped access — row operations run as the request's ephemeral
    /// identity.
    fn scoped(
        &self,
        req: reqwest::RequestBuilder,
        session: &AnonSession,
    ) -> reqwest::RequestBuilder {
        req.header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
    }
}

/// Read a failed response into a store error with status and body.
async fn rest_error(context: &str, resp: reqwest::Response) -> PorticoError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    PorticoError::Store(format!("{context} returned {status}: {body}"))
}

#[async_trait]
impl Store for Supabase {
    async fn mint_session(&self) -> Result<AnonSession, PorticoError> {
        self.signup_anon().await
    }

    async fn find_profile(&self, service_id: i64) -> Result<Option<Profile>, PorticoError> {
        self.profile_by_service_id(service_id).await
    }

    async fn create_profile(&self, new: &NewProfile) -> Result<Profile, PorticoError> {
        self.insert_profile(new).await
    }

    async fn relink_identity(
        &self,
        profile_id: &str,
        auth_user_id: &str,
    ) -> Result<(), PorticoError> {
        self.patch_profile(profile_id, &serde_json::json!({ "auth_user_id": auth_user_id }))
            .await
    }

    async fn set_timezone(&self, profile_id: &str, timezone: &str) -> Result<(), PorticoError> {
        self.patch_profile(profile_id, &serde_json::json!({ "timezone": timezone }))
            .await
    }

    async fn ensure_chat(
        &self,
        session: &AnonSession,
        chat_id: &str,
        profile_id: &str,
    ) -> Result<(), PorticoError> {
        self.insert_chat(session, chat_id, profile_id).await
    }

    async fn ensure_membership(
        &self,
        session: &AnonSession,
        chat_id: &str,
        profile_id: &str,
    ) -> Result<(), PorticoError> {
        self.upsert_membership(session, chat_id, profile_id).await
    }
}
