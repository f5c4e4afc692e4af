//! Recruit Chat - talk to simulated football recruits
//!
//! `serve` runs the reply proxy that forwards a bounded slice of each
//! conversation to an OpenAI-compatible completion API. `chat` is a terminal
//! client that keeps the conversations and talks to a running proxy.

use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex};

use clap::{Parser, Subcommand};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod client;
mod config;
mod conversation;
mod core;
mod providers;
mod roster;
mod routes;

use client::terminal::{self, TerminalView};
use client::{HttpReplyTransport, SendOrchestrator};
use config::Config;
use conversation::ConversationStore;
use crate::core::ReplyEngine;
use providers::{OpenAICompatConfig, OpenAICompatProvider};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub reply_engine: Arc<ReplyEngine>,
    pub limiter: Arc<DefaultDirectRateLimiter>,
}

impl AppState {
    pub fn new(config: Config, reply_engine: ReplyEngine) -> Self {
        let per_minute =
            NonZeroU32::new(config.rate_limit_per_minute).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: Arc::new(RateLimiter::direct(Quota::per_minute(per_minute))),
            reply_engine: Arc::new(reply_engine),
            config,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "recruit-chat", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the reply proxy (default)
    Serve,

    /// Chat with a recruit from the terminal
    Chat {
        /// Recruit id, see `players`
        #[arg(short, long)]
        player: String,

        /// Base URL of a running proxy
        #[arg(long, env = "RECRUIT_PROXY_URL", default_value = "http://127.0.0.1:3000")]
        url: String,
    },

    /// List the recruits
    Players {
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let default_filter = match cli.command {
        Some(Command::Chat { .. }) => "recruit_chat=warn",
        _ => "recruit_chat=debug,tower_http=debug",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve().await,
        Command::Chat { player, url } => chat(&player, &url).await,
        Command::Players { json } => players(json),
    }
}

async fn serve() -> anyhow::Result<()> {
    let config = Config::from_env().inspect_err(|e| tracing::error!("{}", e))?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    let system_prompt = config::resolve_system_prompt(config.persona_file.as_deref()).await?;
    let provider = OpenAICompatProvider::new(OpenAICompatConfig::from_config(&config))?;
    let reply_engine = ReplyEngine::new(provider, system_prompt);

    tracing::info!(
        "🏈 Model {} via {} ({} requests/min)",
        reply_engine.model(),
        config.ai_api_url,
        config.rate_limit_per_minute
    );

    let app = routes::router(AppState::new(config, reply_engine)).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    tracing::info!("🔥 Recruit chat proxy running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn chat(player_id: &str, url: &str) -> anyhow::Result<()> {
    let player = roster::find(player_id)
        .ok_or_else(|| anyhow::anyhow!("Unknown player '{}'. Run `recruit-chat players`.", player_id))?;

    let transport = HttpReplyTransport::new(url);
    tracing::info!("Sending messages to {}", transport.endpoint());

    let store = Arc::new(Mutex::new(ConversationStore::new()));
    let orchestrator = SendOrchestrator::new(store, transport, TerminalView::new(std::io::stdout()));
    orchestrator.open(player);

    terminal::run(&orchestrator, tokio::io::BufReader::new(tokio::io::stdin())).await?;
    println!();
    Ok(())
}

fn players(json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(roster::PLAYERS)?);
    } else {
        terminal::print_roster(&mut std::io::stdout())?;
    }
    Ok(())
}
