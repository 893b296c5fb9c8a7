//! matchcast-gateway server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use matchcast_gateway::api;
use matchcast_gateway::app_state::AppState;
use matchcast_gateway::config::GatewayConfig;
use matchcast_gateway::persistence::MatchStore;
use matchcast_gateway::ws::{AdmissionGate, AllowAll, PolicyGate, RealtimeHub};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = GatewayConfig::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    tracing::info!(addr = %config.listen_addr, "starting matchcast-gateway");

    // Build persistence layer
    let store = match config.database_url.as_deref() {
        Some(url) => MatchStore::connect_postgres(
            url,
            config.database_max_connections,
            Duration::from_secs(config.database_connect_timeout_secs),
        )
        .await
        .context("connecting to PostgreSQL")?,
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store");
            MatchStore::in_memory()
        }
    };

    // Build realtime layer
    let gate: Arc<dyn AdmissionGate> =
        if config.ws.rate_limit_max > 0 || !config.ws.allowed_origins.is_empty() {
            Arc::new(PolicyGate::from_config(&config.ws))
        } else {
            Arc::new(AllowAll)
        };
    let hub = Arc::new(RealtimeHub::new(config.ws.clone(), gate));
    let monitor = hub.spawn_liveness_monitor();

    // Build application state and router
    let app = api::build_app(AppState::new(store, Arc::clone(&hub)));

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    let shutdown_hub = Arc::clone(&hub);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for shutdown signal");
        }
        shutdown_hub.shutdown();
    })
    .await?;

    hub.shutdown();
    if let Err(e) = monitor.await {
        tracing::warn!(error = %e, "liveness monitor ended abnormally");
    }
    tracing::info!("server stopped");

    Ok(())
}
