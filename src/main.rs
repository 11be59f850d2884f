use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chattrivia::{
    api::{self, HostState},
    balance::InMemoryBalances,
    broadcast::event_channel,
    config::{GameSettings, ServerConfig},
    state::GameManager,
};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chattrivia=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting chat trivia...");

    let server_config = ServerConfig::from_env();
    let settings = GameSettings::from_env();

    let (events, _rx) = event_channel();
    let balances = Arc::new(InMemoryBalances::new(server_config.starting_balance));
    let manager = GameManager::new(settings, balances, Arc::new(events.clone()));

    if !manager.initialize().await {
        tracing::warn!("Question source failed to initialize; rounds will retry on create");
    }

    let app = api::router(Arc::new(HostState { manager, events }));

    let addr = SocketAddr::from(([0, 0, 0, 0], server_config.port));
    tracing::info!("Listening on http://{}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
