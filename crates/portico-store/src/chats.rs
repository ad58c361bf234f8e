//! Chat and membership rows — always through the scoped path, so one user
//! cannot write into another's chat by id guessing.

use portico_core::{entity::AnonSession, error::PorticoError};
use reqwest::StatusCode;
use tracing::debug;

use crate::{rest_error, Supabase};

/// Duplicate creation is expected under webhook redelivery; a uniqueness
/// conflict means the row is already there.
fn duplicate_is_success(status: StatusCode) -> bool {
    status.is_success() || status == StatusCode::CONFLICT
}

impl Supabase {
    pub(crate) async fn insert_chat(
        &self,
        session: &AnonSession,
        chat_id: &str,
        profile_id: &str,
    ) -> Result<(), PorticoError> {
        debug!("store: POST chats id={chat_id}");

        let resp = self
            .scoped(self.http.post(self.rest_url("chats")), session)
            .json(&serde_json::json!({
                "id": chat_id,
                "profile_id": profile_id,
            }))
            .send()
            .await
            .map_err(|e| PorticoError::Store(format!("chat insert failed: {e}")))?;

        if !duplicate_is_success(resp.status()) {
            return Err(rest_error("chat insert", resp).await);
        }

        Ok(())
    }

    pub(crate) async fn upsert_membership(
        &self,
        session: &AnonSession,
        chat_id: &str,
        profile_id: &str,
    ) -> Result<(), PorticoError> {
        let url = format!(
            "{}?on_conflict=chat_id,profile_id",
            self.rest_url("chat_users")
        );
        debug!("store: POST chat_users chat={chat_id} profile={profile_id}");

        let resp = self
            .scoped(self.http.post(&url), session)
            .header("Prefer", "resolution=ignore-duplicates")
            .json(&serde_json::json!({
                "chat_id": chat_id,
                "profile_id": profile_id,
            }))
            .send()
            .await
            .map_err(|e| PorticoError::Store(format!("membership upsert failed: {e}")))?;

        if !duplicate_is_success(resp.status()) {
            return Err(rest_error("membership upsert", resp).await);
        }

        Ok(())
    }
}
