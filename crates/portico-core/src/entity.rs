//! Durable backend entities and the derived onboarding state.

use serde::{Deserialize, Serialize};

/// Durable backend record for one external chat-platform user.
///
/// Keyed by `service_id` (the platform user id); exactly one row per
/// distinct external user. `timezone` stays null until onboarding commits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    /// Backend-auth identity currently linked to this profile. Re-pointed
    /// on every request that mints a new ephemeral session.
    pub auth_user_id: String,
    pub service_id: i64,
    pub handle: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub timezone: Option<String>,
}

/// Insert payload for a first-ever sender.
#[derive(Debug, Clone, Serialize)]
pub struct NewProfile {
    pub auth_user_id: String,
    pub service_id: i64,
    pub handle: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Always null at creation; set exactly once by the onboarding engine.
    pub timezone: Option<String>,
}

/// Ephemeral backend identity minted for a single request.
///
/// The bearer token scopes row access to this identity; it is never
/// persisted and expires with the backend's session policy.
#[derive(Debug, Clone)]
pub struct AnonSession {
    pub identity_id: String,
    pub access_token: String,
}

/// Per-request onboarding state, derived from the profile rather than
/// stored, so retries re-enter the same branch until the timezone commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnboardingState {
    AwaitingTimezone,
    Ready,
}

impl OnboardingState {
    /// Derive the state from a profile. An empty-string timezone counts as
    /// unset so a bad historical write cannot strand the user.
    pub fn of(profile: &Profile) -> Self {
        if profile.timezone.as_deref().unwrap_or("").trim().is_empty() {
            Self::AwaitingTimezone
        } else {
            Self::Ready
        }
    }
}
