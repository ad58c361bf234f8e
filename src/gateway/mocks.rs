//! Test doubles for the gateway's external seams.

use async_trait::async_trait;
use portico_core::{
    entity::{AnonSession, NewProfile, Profile},
    error::PorticoError,
    event::{Inbound, OnboardingReply, ProcessRequest, Sender},
    tool::Tool,
    traits::{Downstream, Messenger, Provider, Store},
};
use std::sync::{Arc, Mutex};

use super::Gateway;

/// In-memory store with the same idempotency semantics as the backend:
/// duplicate chat/membership creation is a recorded attempt but not a
/// second row, and never an error.
#[derive(Default)]
pub(crate) struct MockStore {
    pub profiles: Mutex<Vec<Profile>>,
    pub minted: Mutex<u32>,
    pub chat_attempts: Mutex<u32>,
    pub chats: Mutex<Vec<String>>,
    pub membership_attempts: Mutex<u32>,
    pub memberships: Mutex<Vec<(String, String)>>,
    pub relinks: Mutex<Vec<(String, String)>>,
    pub fail_mint: bool,
}

impl MockStore {
    pub fn seed_profile(&self, service_id: i64, auth_user_id: &str, timezone: Option<&str>) {
        self.profiles.lock().unwrap().push(Profile {
            id: format!("p-{service_id}"),
            auth_user_id: auth_user_id.to_string(),
            service_id,
            handle: None,
            first_name: None,
            last_name: None,
            timezone: timezone.map(String::from),
        });
    }

    pub fn timezone_of(&self, service_id: i64) -> Option<String> {
        self.profiles
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.service_id == service_id)
            .and_then(|p| p.timezone.clone())
    }
}

#[async_trait]
impl Store for MockStore {
    async fn mint_session(&self) -> Result<AnonSession, PorticoError> {
        if self.fail_mint {
            return Err(PorticoError::Store("auth service unreachable".into()));
        }
        let mut n = self.minted.lock().unwrap();
        *n += 1;
        Ok(AnonSession {
            identity_id: format!("anon-{n}"),
            access_token: "tok".into(),
        })
    }

    async fn find_profile(&self, service_id: i64) -> Result<Option<Profile>, PorticoError> {
        Ok(self
            .profiles
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.service_id == service_id)
            .cloned())
    }

    async fn create_profile(&self, new: &NewProfile) -> Result<Profile, PorticoError> {
        let profile = Profile {
            id: format!("p-{}", new.service_id),
            auth_user_id: new.auth_user_id.clone(),
            service_id: new.service_id,
            handle: new.handle.clone(),
            first_name: new.first_name.clone(),
            last_name: new.last_name.clone(),
            timezone: new.timezone.clone(),
        };
        self.profiles.lock().unwrap().push(profile.clone());
        Ok(profile)
    }

    async fn relink_identity(
        &self,
        profile_id: &str,
        auth_user_id: &str,
    ) -> Result<(), PorticoError> {
        self.relinks
            .lock()
            .unwrap()
            .push((profile_id.to_string(), auth_user_id.to_string()));
        if let Some(p) = self
            .profiles
            .lock()
            .unwrap()
            .iter_mut()
            .find(|p| p.id == profile_id)
        {
            p.auth_user_id = auth_user_id.to_string();
        }
        Ok(())
    }

    async fn set_timezone(&self, profile_id: &str, timezone: &str) -> Result<(), PorticoError> {
        match self
            .profiles
            .lock()
            .unwrap()
            .iter_mut()
            .find(|p| p.id == profile_id)
        {
            Some(p) => {
                p.timezone = Some(timezone.to_string());
                Ok(())
            }
            None => Err(PorticoError::Store(format!("no profile {profile_id}"))),
        }
    }

    async fn ensure_chat(
        &self,
        _session: &AnonSession,
        chat_id: &str,
        _profile_id: &str,
    ) -> Result<(), PorticoError> {
        *self.chat_attempts.lock().unwrap() += 1;
        let mut chats = self.chats.lock().unwrap();
        if !chats.iter().any(|c| c == chat_id) {
            chats.push(chat_id.to_string());
        }
        Ok(())
    }

    async fn ensure_membership(
        &self,
        _session: &AnonSession,
        chat_id: &str,
        profile_id: &str,
    ) -> Result<(), PorticoError> {
        *self.membership_attempts.lock().unwrap() += 1;
        let pair = (chat_id.to_string(), profile_id.to_string());
        let mut memberships = self.memberships.lock().unwrap();
        if !memberships.contains(&pair) {
            memberships.push(pair);
        }
        Ok(())
    }
}

/// Scripted model: optionally commits a timezone through the offered tool,
/// then replies with a fixed text.
#[derive(Default)]
pub(crate) struct MockProvider {
    pub reply: String,
    pub commit: Option<String>,
    pub fail: bool,
    pub calls: Mutex<u32>,
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn requires_api_key(&self) -> bool {
        false
    }

    async fn run_turn(
        &self,
        _instructions: &str,
        _prompt: &str,
        tools: &[Arc<dyn Tool>],
        _max_steps: u32,
    ) -> Result<String, PorticoError> {
        *self.calls.lock().unwrap() += 1;
        if self.fail {
            return Err(PorticoError::Provider("model unavailable".into()));
        }
        if let Some(tz) = &self.commit {
            let result = tools[0]
                .execute(&serde_json::json!({ "timezone": tz }))
                .await;
            assert!(!result.is_error, "tool commit failed: {}", result.content);
        }
        Ok(self.reply.clone())
    }

    async fn is_available(&self) -> bool {
        true
    }
}

#[derive(Default)]
pub(crate) struct MockMessenger {
    pub sent: Mutex<Vec<(String, String)>>,
    pub acks: Mutex<Vec<String>>,
}

#[async_trait]
impl Messenger for MockMessenger {
    fn name(&self) -> &str {
        "mock"
    }

    async fn send_text(&self, chat_id: &str, text: &str) -> Result<(), PorticoError> {
        self.sent
            .lock()
            .unwrap()
            .push((chat_id.to_string(), text.to_string()));
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), PorticoError> {
        self.acks.lock().unwrap().push(callback_id.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct MockDownstream {
    pub dispatched: Mutex<Vec<ProcessRequest>>,
    pub delivered: Mutex<Vec<OnboardingReply>>,
    pub fail_deliver: bool,
}

#[async_trait]
impl Downstream for MockDownstream {
    async fn dispatch(&self, request: &ProcessRequest) -> Result<(), PorticoError> {
        self.dispatched.lock().unwrap().push(request.clone());
        Ok(())
    }

    async fn deliver_onboarding(&self, reply: &OnboardingReply) -> Result<(), PorticoError> {
        if self.fail_deliver {
            return Err(PorticoError::Dispatch("delivery callback down".into()));
        }
        self.delivered.lock().unwrap().push(reply.clone());
        Ok(())
    }
}

/// A fully mocked gateway plus handles on every seam.
pub(crate) struct Harness {
    pub store: Arc<MockStore>,
    pub provider: Arc<MockProvider>,
    pub messenger: Arc<MockMessenger>,
    pub downstream: Arc<MockDownstream>,
    pub gateway: Arc<Gateway>,
}

pub(crate) fn harness(
    store: MockStore,
    provider: MockProvider,
    downstream: MockDownstream,
    allowed_users: Vec<String>,
    webhook_secret: Option<&str>,
) -> Harness {
    let store = Arc::new(store);
    let provider = Arc::new(provider);
    let messenger = Arc::new(MockMessenger::default());
    let downstream = Arc::new(downstream);
    let gateway = Arc::new(Gateway {
        store: store.clone(),
        provider: provider.clone(),
        messenger: messenger.clone(),
        downstream: downstream.clone(),
        webhook_secret: webhook_secret.map(String::from),
        allowed_users,
        max_steps: 4,
    });
    Harness {
        store,
        provider,
        messenger,
        downstream,
        gateway,
    }
}

pub(crate) fn message(text: &str, sender_id: i64, handle: Option<&str>, chat_id: &str) -> Inbound {
    Inbound::Message {
        prompt: text.to_string(),
        sender: Sender {
            id: sender_id,
            handle: handle.map(String::from),
            first_name: Some("Test".into()),
            last_name: None,
        },
        chat_id: chat_id.to_string(),
    }
}

/// Let spawned fire-and-forget tasks run to completion on the test runtime.
pub(crate) async fn drain_spawned() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}
