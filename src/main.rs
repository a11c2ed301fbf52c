//! ProjectHub Server — collaborative workspace audit and notification engine
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use projecthub_core::config::AppConfig;
use projecthub_core::error::AppError;
use projecthub_realtime::bridge::MemoryChangeFeed;
use projecthub_realtime::registry::LiveFeedRegistry;
use projecthub_service::audit::AuditLedger;
use projecthub_service::chat::ChatService;
use projecthub_service::notification::{NoticeFanout, NotificationAggregator};

#[tokio::main]
async fn main() {
    let env = std::env::var("PROJECTHUB_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt().json().with_env_filter(filter).with_target(true).init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting ProjectHub v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Store backend ────────────────────────────────────
    let stores = projecthub_database::provider::StoreManager::connect(&config.database).await?;

    // ── Step 2: Change feed ──────────────────────────────────────
    let change_feed = Arc::new(MemoryChangeFeed::new(config.realtime.channel_buffer_size));

    // ── Step 3: Services ─────────────────────────────────────────
    let ledger = Arc::new(AuditLedger::new(
        Arc::clone(&stores.audit),
        change_feed.clone(),
    ));
    let aggregator = Arc::new(NotificationAggregator::new(
        Arc::clone(&stores.audit),
        Arc::clone(&stores.notices),
        Arc::clone(&stores.chat),
        Arc::clone(&stores.roster),
        change_feed.clone(),
    ));
    let chat = Arc::new(ChatService::new(
        Arc::clone(&stores.chat),
        Arc::clone(&stores.roster),
        change_feed.clone(),
    ));
    let fanout = Arc::new(NoticeFanout::new(
        Arc::clone(&stores.notices),
        Arc::clone(&stores.roster),
        change_feed.clone(),
    ));
    tracing::info!("Services initialized");

    // ── Step 4: Live feed registry ───────────────────────────────
    let live_feeds = Arc::new(LiveFeedRegistry::new(
        Arc::clone(&aggregator),
        change_feed.clone(),
        config.realtime.clone(),
    ));

    // ── Step 5: Build and start HTTP server ──────────────────────
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let state = projecthub_api::state::ApiState {
        config: Arc::new(config),
        stores,
        ledger,
        aggregator,
        chat,
        fanout,
        live_feeds: Arc::clone(&live_feeds),
    };
    let app = projecthub_api::router::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("ProjectHub server listening on {addr}");

    // ── Step 6: Graceful shutdown ────────────────────────────────
    let (shutdown_tx, _shutdown_rx) = watch::channel(false);

    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        let _ = shutdown_tx.send(true);
        live_feeds.shutdown_all();
    });

    server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    tracing::info!("ProjectHub server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
