//! System endpoints: health check and realtime statistics.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
}

/// Snapshot of the realtime layer.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeStats {
    /// Registered WebSocket connections.
    pub connections: usize,
    /// Matches with at least one subscriber.
    pub subscribed_matches: usize,
    /// Frames dropped for live connections whose outbound queue was full.
    pub dropped_frames: u64,
    /// Whether the hub has begun shutting down.
    pub shutting_down: bool,
}

/// `GET /health`: Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// `GET /realtime/stats`: Connection and subscription counts.
#[utoipa::path(
    get,
    path = "/api/v1/realtime/stats",
    tag = "System",
    summary = "Realtime statistics",
    description = "Returns the number of live WebSocket connections, subscribed matches and dropped outbound frames.",
    responses(
        (status = 200, description = "Current counts", body = RealtimeStats),
    )
)]
pub async fn realtime_stats_handler(State(state): State<AppState>) -> impl IntoResponse {
    let hub = &state.hub;
    Json(RealtimeStats {
        connections: hub.registry().len(),
        subscribed_matches: hub.index().match_count(),
        dropped_frames: hub.dropped_frames(),
        shutting_down: hub.is_shutting_down(),
    })
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_handler))
}

/// Realtime statistics route, nested under /api/v1.
pub fn stats_routes() -> Router<AppState> {
    Router::new().route("/realtime/stats", get(realtime_stats_handler))
}
