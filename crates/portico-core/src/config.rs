//! Gateway configuration — TOML file with environment-variable overrides.
//!
//! Secrets (bot token, store keys, model keys) are usually injected via
//! environment variables in deployment; the TOML file carries everything
//! else. A missing config file falls back to defaults so `portico status`
//! works out of the box.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::PorticoError;

/// Top-level portico configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub downstream: DownstreamConfig,
}

/// General gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_level: default_log_level(),
        }
    }
}

/// Inbound HTTP listener.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Telegram webhook and outbound API config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    /// Shared secret compared against the platform's secret-token header.
    /// Unset means the gateway refuses all webhook traffic (fail closed).
    #[serde(default)]
    pub webhook_secret: Option<String>,
    /// Allowed usernames. Empty = allow everyone.
    #[serde(default)]
    pub allowed_users: Vec<String>,
}

/// Backend store (Supabase) config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub url: String,
    /// Privileged key — profile reads/writes and the timezone commit only.
    #[serde(default)]
    pub service_key: String,
    /// Anonymous-session key — mints the per-request scoped credential.
    #[serde(default)]
    pub anon_key: String,
}

/// Language-model provider selection for the onboarding turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Which provider runs onboarding: "openai" or "anthropic".
    #[serde(default = "default_provider")]
    pub default: String,
    /// Hard cap on model round-trips per onboarding turn.
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,
    pub openai: Option<OpenAiConfig>,
    pub anthropic: Option<AnthropicConfig>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            default: default_provider(),
            max_steps: default_max_steps(),
            openai: Some(OpenAiConfig::default()),
            anthropic: None,
        }
    }
}

/// OpenAI-compatible provider config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_openai_model")]
    pub model: String,
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_openai_model(),
            base_url: default_openai_base_url(),
        }
    }
}

/// Anthropic provider config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_anthropic_model")]
    pub model: String,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_anthropic_model(),
        }
    }
}

/// Downstream delivery targets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DownstreamConfig {
    /// The processing service that handles steady-state prompts.
    #[serde(default)]
    pub processor_url: String,
    /// The delivery callback that receives finished onboarding replies.
    #[serde(default)]
    pub onboarding_url: String,
}

/// Load configuration from a TOML file, then apply env-var overrides.
///
/// Falls back to defaults if the file does not exist.
pub fn load(path: &str) -> Result<Config, PorticoError> {
    let path = Path::new(path);
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PorticoError::Config(format!("failed to read {}: {e}", path.display())))?;
        toml::from_str(&content)
            .map_err(|e| PorticoError::Config(format!("failed to parse config: {e}")))?
    } else {
        tracing::info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        Config::default()
    };

    apply_env_overrides(&mut config);
    Ok(config)
}

/// Environment variables win over file values. Secrets normally arrive
/// this way in deployment.
fn apply_env_overrides(config: &mut Config) {
    if let Ok(v) = std::env::var("TELEGRAM_BOT_TOKEN") {
        config.telegram.bot_token = v;
    }
    if let Ok(v) = std::env::var("TELEGRAM_WEBHOOK_SECRET") {
        config.telegram.webhook_secret = Some(v);
    }
    if let Ok(v) = std::env::var("TELEGRAM_ALLOWED_USERS") {
        config.telegram.allowed_users = parse_allow_list(&v);
    }
    if let Ok(v) = std::env::var("SUPABASE_URL") {
        config.store.url = v;
    }
    if let Ok(v) = std::env::var("SUPABASE_SERVICE_KEY") {
        config.store.service_key = v;
    }
    if let Ok(v) = std::env::var("SUPABASE_ANON_KEY") {
        config.store.anon_key = v;
    }
    if let Ok(v) = std::env::var("LLM_API_KEY") {
        match config.provider.default.as_str() {
            "anthropic" => {
                config.provider.anthropic.get_or_insert_with(Default::default).api_key = v;
            }
            _ => {
                config.provider.openai.get_or_insert_with(Default::default).api_key = v;
            }
        }
    }
    if let Ok(v) = std::env::var("LLM_MODEL") {
        match config.provider.default.as_str() {
            "anthropic" => {
                config.provider.anthropic.get_or_insert_with(Default::default).model = v;
            }
            _ => {
                config.provider.openai.get_or_insert_with(Default::default).model = v;
            }
        }
    }
    if let Ok(v) = std::env::var("PROCESSOR_URL") {
        config.downstream.processor_url = v;
    }
    if let Ok(v) = std::env::var("ONBOARDING_URL") {
        config.downstream.onboarding_url = v;
    }
}

/// Parse a comma-separated allow-list into trimmed, non-empty entries.
pub fn parse_allow_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

impl Config {
    /// Check that everything `start` needs is present. The webhook secret
    /// is deliberately NOT required here — its absence is handled at
    /// request time with a 503 so the operator sees the misconfiguration.
    pub fn validate(&self) -> Result<(), PorticoError> {
        if self.telegram.bot_token.is_empty() {
            return Err(PorticoError::Config(
                "telegram.bot_token is empty. Set it in config.toml or TELEGRAM_BOT_TOKEN".into(),
            ));
        }
        if self.store.url.is_empty() || self.store.service_key.is_empty() || self.store.anon_key.is_empty() {
            return Err(PorticoError::Config(
                "store.url, store.service_key, and store.anon_key are all required".into(),
            ));
        }
        let key_missing = match self.provider.default.as_str() {
            "openai" => self.provider.openai.as_ref().map_or(true, |p| p.api_key.is_empty()),
            "anthropic" => self.provider.anthropic.as_ref().map_or(true, |p| p.api_key.is_empty()),
            other => {
                return Err(PorticoError::Config(format!("unsupported provider: {other}")));
            }
        };
        if key_missing {
            return Err(PorticoError::Config(format!(
                "provider '{}' has no api_key. Set it in config.toml or LLM_API_KEY",
                self.provider.default
            )));
        }
        if self.downstream.processor_url.is_empty() || self.downstream.onboarding_url.is_empty() {
            return Err(PorticoError::Config(
                "downstream.processor_url and downstream.onboarding_url are required".into(),
            ));
        }
        Ok(())
    }
}

// --- Default value functions ---

fn default_name() -> String {
    "portico".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8787
}
fn default_provider() -> String {
    "openai".to_string()
}
fn default_max_steps() -> u32 {
    4
}
fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_anthropic_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}
