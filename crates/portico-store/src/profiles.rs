//! Profile rows — always through the privileged path, since a profile may
//! not exist yet when the lookup runs and no scoped session is tied to it.

use portico_core::{
    entity::{NewProfile, Profile},
    error::PorticoError,
};
use tracing::debug;

use crate::{rest_error, Supabase};

impl Supabase {
    pub(crate) async fn profile_by_service_id(
        &self,
        service_id: i64,
    ) -> Result<Option<Profile>, PorticoError> {
        let url = format!(
            "{}?service_id=eq.{service_id}&select=*&limit=1",
            self.rest_url("profiles")
        );
        debug!("store: GET profiles service_id={service_id}");

        let resp = self
            .privileged(self.http.get(&url))
            .send()
            .await
            .map_err(|e| PorticoError::Store(format!("profile lookup failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(rest_error("profile lookup", resp).await);
        }

        let mut rows: Vec<Profile> = resp
            .json()
            .await
            .map_err(|e| PorticoError::Store(format!("profile lookup: bad response: {e}")))?;

        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.remove(0))
        })
    }

    pub(crate) async fn insert_profile(&self, new: &NewProfile) -> Result<Profile, PorticoError> {
        debug!("store: POST profiles service_id={}", new.service_id);

        let resp = self
            .privileged(self.http.post(self.rest_url("profiles")))
            .header("Prefer", "return=representation")
            .json(new)
            .send()
            .await
            .map_err(|e| PorticoError::Store(format!("profile insert failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(rest_error("profile insert", resp).await);
        }

        let mut rows: Vec<Profile> = resp
            .json()
            .await
            .map_err(|e| PorticoError::Store(format!("profile insert: bad response: {e}")))?;

        if rows.is_empty() {
            return Err(PorticoError::Store(
                "profile insert returned no row".to_string(),
            ));
        }
        Ok(rows.remove(0))
    }

    pub(crate) async fn patch_profile(
        &self,
        profile_id: &str,
        patch: &serde_json::Value,
    ) -> Result<(), PorticoError> {
        let url = format!("{}?id=eq.{profile_id}", self.rest_url("profiles"));
        debug!("store: PATCH profiles id={profile_id}");

        let resp = self
            .privileged(self.http.patch(&url))
            .json(patch)
            .send()
            .await
            .map_err(|e| PorticoError::Store(format!("profile update failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(rest_error("profile update", resp).await);
        }

        Ok(())
    }
}
