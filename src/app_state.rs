//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::persistence::MatchStore;
use crate::service::MatchService;
use crate::ws::RealtimeHub;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Match service for all record writes and reads.
    pub match_service: Arc<MatchService>,
    /// Realtime hub for WebSocket connections and broadcasts.
    pub hub: Arc<RealtimeHub>,
}

impl AppState {
    /// Builds the state from a store and a hub, wiring the service's
    /// publish side to the hub's broadcaster.
    #[must_use]
    pub fn new(store: MatchStore, hub: Arc<RealtimeHub>) -> Self {
        let match_service = Arc::new(MatchService::new(store, hub.broadcaster().clone()));
        Self { match_service, hub }
    }
}
