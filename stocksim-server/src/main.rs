//! stocksim-server - Stock tracking simulator service
//!
//! Serves the dashboard and REST API on 127.0.0.1:8000 by default and runs
//! the market monitor in the background.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use stocksim_common::config::ConfigResolver;
use stocksim_common::EventBus;
use stocksim_server::config::{Args, Config, Storage};
use stocksim_server::market::Market;
use stocksim_server::monitor::MarketMonitor;
use stocksim_server::portfolio::Portfolio;
use stocksim_server::{build_router, AppState};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is read before tracing exists so its log level can seed the filter
    let loaded = ConfigResolver::new(args.config.clone())
        .load()
        .context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "stocksim_server={level},stocksim_common={level},tower_http=info",
                    level = loaded.config.logging.level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting StockSim server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    loaded.source.log();

    let config = Config::resolve(loaded.config, &args).context("Invalid configuration")?;

    let event_bus = EventBus::new(100);

    let portfolio = match &config.storage {
        Storage::File(path) => {
            info!("Database: {}", path.display());
            let pool = stocksim_common::db::init_database(path)
                .await
                .context("Failed to open database")?;
            Portfolio::with_database(pool, event_bus.clone())
                .await
                .context("Failed to restore portfolio")?
        }
        Storage::Memory => {
            info!("Ephemeral mode: state is kept in memory only");
            let pool = stocksim_common::db::init_memory_database()
                .await
                .context("Failed to open in-memory database")?;
            Portfolio::with_database(pool, event_bus.clone())
                .await
                .context("Failed to initialize portfolio")?
        }
    };
    let portfolio = Arc::new(portfolio);

    let source = config.price_source().context("Failed to build price source")?;
    let market = Arc::new(Market::new(config.watchlist(), source));
    info!(
        "Watchlist: {} (source: {})",
        market.watchlist().symbols().join(", "),
        market.source_name()
    );

    let cancel = CancellationToken::new();
    let monitor = MarketMonitor::new(
        portfolio.clone(),
        market.clone(),
        event_bus.clone(),
        config.monitor,
    );
    let monitor_status = monitor.status();
    let monitor_handle = monitor.spawn(cancel.clone());

    let state = AppState::new(
        portfolio,
        market,
        event_bus,
        monitor_status,
        config.monitor,
    );
    let app = build_router(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    info!("Listening on http://{}/", bind_addr);
    info!("Status: http://{}/status", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    cancel.cancel();
    monitor_handle.await.context("Market monitor task failed")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
