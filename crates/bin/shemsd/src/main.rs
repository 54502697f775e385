//! # shemsd: smart home energy management daemon
//!
//! Composition root that wires all adapters together, runs the control loop
//! and serves the API.
//!
//! ## Responsibilities
//! - Load configuration (`shems.toml`, `SHEMS_*` env vars)
//! - Initialize logging
//! - Open the `SQLite` pool and run migrations
//! - Build the notifier fan-out (live stream plus optional webhook relay)
//! - Start the periodic scheduler and share it with the HTTP layer
//! - Serve until SIGINT/SIGTERM, then stop the scheduler between ticks
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod config;
mod telemetry;

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;

use shems_adapter_http_axum::state::AppState;
use shems_adapter_notify_webhook::Config as WebhookConfig;
use shems_adapter_storage_sqlite_sqlx::Config as StorageConfig;
use shems_app::broadcaster::TransitionBroadcaster;
use shems_app::scheduler::Scheduler;
use shems_app::tick::{TickOrchestrator, TickSettings};

/// Buffered transitions per live-stream subscriber.
const TRANSITION_CHANNEL_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::Config::load().context("failed to load configuration")?;
    telemetry::init_tracing(&config.logging.filter);

    // Database
    let db = StorageConfig {
        database_url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..StorageConfig::default()
    }
    .build()
    .await
    .with_context(|| format!("failed to open database {}", config.database.url))?;
    let store = db.store();

    // Notifications
    let transitions = TransitionBroadcaster::new(TRANSITION_CHANNEL_CAPACITY);
    let webhook = config
        .notify
        .webhook_url
        .clone()
        .map(|url| {
            WebhookConfig {
                url,
                timeout: config.notify.webhook_timeout(),
            }
            .build()
        })
        .transpose()
        .context("failed to build webhook notifier")?;
    if webhook.is_none() {
        tracing::warn!("no webhook relay configured, transitions only reach the live stream");
    }
    let notifier = (transitions.clone(), webhook);

    // Control loop
    let settings = TickSettings {
        store_timeout: config.simulation.store_timeout(),
        notify_timeout: config.simulation.notify_timeout(),
    };
    let mut orchestrator = TickOrchestrator::new(store.clone(), notifier, settings);
    if let Some(seed) = config.simulation.seed {
        orchestrator = orchestrator.with_seed(seed);
    }
    let scheduler = Arc::new(Scheduler::new(orchestrator, config.simulation.period()));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let ticker = Arc::clone(&scheduler).start(shutdown_rx);

    // HTTP
    let state = AppState::new(store, scheduler, transitions);
    let app = shems_adapter_http_axum::router::build(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(
        %bind_addr,
        period_secs = config.simulation.period_secs,
        "shemsd listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(telemetry::shutdown_signal())
        .await
        .context("server error")?;

    // The loop may already be gone; nothing to signal then.
    let _ = shutdown_tx.send(true);
    ticker.await.context("scheduler task failed")?;
    tracing::info!("shutdown complete");

    Ok(())
}
