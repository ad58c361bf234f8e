mod downstream;
mod gateway;
mod server;

use clap::{Parser, Subcommand};
use portico_channels::telegram::TelegramApi;
use portico_core::{
    config,
    traits::{Downstream, Messenger, Provider, Store},
};
use portico_providers::{anthropic::AnthropicProvider, openai::OpenAiProvider};
use portico_store::Supabase;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "portico",
    version,
    about = "portico — message-ingestion gateway for a conversational-AI pipeline"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the webhook gateway.
    Start,
    /// Check configuration and provider availability.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Start => {
            let cfg = config::load(&cli.config)?;
            cfg.validate()?;

            let provider = build_provider(&cfg)?;
            if !provider.is_available().await {
                anyhow::bail!("provider '{}' is not available", provider.name());
            }

            let store: Arc<dyn Store> = Arc::new(Supabase::new(&cfg.store));
            let messenger: Arc<dyn Messenger> =
                Arc::new(TelegramApi::new(&cfg.telegram.bot_token));
            let downstream: Arc<dyn Downstream> = Arc::new(downstream::HttpDownstream::new(
                &cfg.downstream,
                &cfg.store.service_key,
            ));

            let gw = Arc::new(gateway::Gateway::new(
                store, provider, messenger, downstream, &cfg,
            ));

            println!("portico — starting gateway...");
            server::serve(gw, &cfg.server.host, cfg.server.port).await?;
        }
        Commands::Status => {
            let cfg = config::load(&cli.config)?;
            println!("portico — status check\n");
            println!("Config: {}", cli.config);
            println!("Default provider: {}", cfg.provider.default);
            println!();

            match build_provider(&cfg) {
                Ok(provider) => {
                    println!(
                        "  {}: {}",
                        provider.name(),
                        if provider.is_available().await {
                            "available"
                        } else {
                            "not available"
                        }
                    );
                }
                Err(e) => println!("  provider: {e}"),
            }

            println!(
                "  telegram: {}",
                if cfg.telegram.bot_token.is_empty() {
                    "missing bot_token"
                } else {
                    "configured"
                }
            );
            println!(
                "  webhook secret: {}",
                match cfg.telegram.webhook_secret.as_deref() {
                    Some(s) if !s.is_empty() => "configured",
                    _ => "NOT SET — all webhook traffic will be refused",
                }
            );
            println!(
                "  store: {}",
                if cfg.store.url.is_empty() {
                    "missing url"
                } else {
                    &cfg.store.url
                }
            );
            println!(
                "  downstream: {}",
                if cfg.downstream.processor_url.is_empty() {
                    "missing processor_url"
                } else {
                    &cfg.downstream.processor_url
                }
            );
        }
    }

    Ok(())
}

/// Build the configured onboarding provider.
fn build_provider(cfg: &config::Config) -> anyhow::Result<Arc<dyn Provider>> {
    match cfg.provider.default.as_str() {
        "openai" => {
            let p = cfg.provider.openai.clone().unwrap_or_default();
            Ok(Arc::new(OpenAiProvider::from_config(
                p.base_url, p.api_key, p.model,
            )))
        }
        "anthropic" => {
            let p = cfg.provider.anthropic.clone().unwrap_or_default();
            Ok(Arc::new(AnthropicProvider::from_config(p.api_key, p.model)))
        }
        other => anyhow::bail!("unsupported provider: {other}"),
    }
}
