//! waitlist-gateway server entry point.
//!
//! Wires the store, notification worker, and background tasks, then
//! serves the REST API until Ctrl+C or SIGTERM.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use waitlist_gateway::api;
use waitlist_gateway::app_state::AppState;
use waitlist_gateway::config::{GatewayConfig, LogFormat};
use waitlist_gateway::domain::{EventBus, SystemClock};
use waitlist_gateway::notify::{LogNotifier, NotificationDispatcher};
use waitlist_gateway::persistence::PostgresStore;
use waitlist_gateway::service::{AdmissionService, spawn_audit_log, spawn_expiry_sweeper};
use waitlist_gateway::store::{AdmissionStore, MemoryStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = GatewayConfig::from_env()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    init_tracing(config.log_format);
    tracing::info!(addr = %config.listen_addr, "starting waitlist-gateway");

    // Build store
    let store: Arc<dyn AdmissionStore> = if config.persistence_enabled {
        let postgres = PostgresStore::connect(&config)
            .await
            .context("connecting to PostgreSQL")?;
        postgres.migrate().await.context("running migrations")?;
        Arc::new(postgres)
    } else {
        tracing::warn!("persistence disabled; records are kept in memory only");
        Arc::new(MemoryStore::new())
    };
    tracing::info!(backend = store.backend_name(), "store ready");

    // Build service layer
    let event_bus = EventBus::new(config.event_bus_capacity);
    let (notifications, _notify_worker) =
        NotificationDispatcher::spawn(Arc::new(LogNotifier), config.notification_queue_capacity);
    let admission = Arc::new(AdmissionService::new(
        store,
        event_bus.clone(),
        notifications,
        Arc::new(SystemClock),
        config.request_ttl(),
    ));

    // Background tasks
    let _audit = spawn_audit_log(&event_bus);
    let _sweeper = spawn_expiry_sweeper(
        Arc::clone(&admission),
        Duration::from_secs(config.expiry_sweep_interval_secs),
    );

    // Build router
    let app = api::build_app(
        AppState::new(admission),
        Duration::from_secs(config.request_timeout_secs),
    );

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    tracing::info!("server stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Json => tracing_subscriber::fmt().with_env_filter(filter).json().init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
