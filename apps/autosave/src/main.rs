mod autosave;
mod config;
mod document;
mod editor;
mod errors;
mod models;
mod notify;
mod preview;
mod registry;
mod routes;
mod state;
mod storage;
mod template;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::watch;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, StorageBackend};
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::{FileSlotStorage, MemorySlotStorage, SlotStorage};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume autosave v{}", env!("CARGO_PKG_VERSION"));

    let storage: Arc<dyn SlotStorage> = match config.storage_backend {
        StorageBackend::File => {
            let storage = FileSlotStorage::new(&config.data_dir, config.storage_quota_bytes)?;
            info!("Storing slots under {}", storage.dir().display());
            Arc::new(storage)
        }
        StorageBackend::Memory => {
            info!("Using in-memory storage; nothing survives a restart");
            Arc::new(MemorySlotStorage::new().with_quota(config.storage_quota_bytes))
        }
    };

    let state = AppState::new(storage, &config);
    let scheduler = state.scheduler.clone();
    info!("Autosave debounce: {}ms", scheduler.delay().as_millis());
    let shutdown = state.shutdown.clone();

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("{}:{}", config.bind_addr, config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    // Armed saves must not be lost on exit.
    info!("Flushing pending saves");
    scheduler.flush().await;

    Ok(())
}

async fn shutdown_signal(shutdown: Arc<watch::Sender<bool>>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Could not listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
    // Ends open event streams so the server can drain.
    shutdown.send_replace(true);
}
