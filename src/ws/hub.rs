//! Realtime hub: owns the connection registry, the subscription index and
//! the broadcast engine, and ties their lifecycles together.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::admission::{Admission, AdmissionGate, DenyReason, HandshakeContext};
use super::broadcast::Broadcaster;
use super::client::{ClientConnection, ConnectionId, Outbound};
use super::liveness::LivenessMonitor;
use super::messages::{ServerMessage, WELCOME_MESSAGE};
use super::registry::ConnectionRegistry;
use super::subscription::{SubscribeOutcome, SubscriptionIndex};
use crate::config::WsConfig;
use crate::domain::MatchId;

/// Entry point of the realtime layer shared by the HTTP handlers, the
/// WebSocket handler and the match service.
#[derive(Debug)]
pub struct RealtimeHub {
    registry: Arc<ConnectionRegistry>,
    index: Arc<SubscriptionIndex>,
    broadcaster: Broadcaster,
    gate: Arc<dyn AdmissionGate>,
    config: WsConfig,
    shutdown: CancellationToken,
}

impl RealtimeHub {
    /// Creates a hub with empty registry and index.
    #[must_use]
    pub fn new(config: WsConfig, gate: Arc<dyn AdmissionGate>) -> Self {
        let index = Arc::new(SubscriptionIndex::new());
        let registry = Arc::new(ConnectionRegistry::new(Arc::clone(&index)));
        let broadcaster = Broadcaster::new(Arc::clone(&registry), Arc::clone(&index));
        Self {
            registry,
            index,
            broadcaster,
            gate,
            config,
            shutdown: CancellationToken::new(),
        }
    }

    /// Connection registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Subscription index.
    #[must_use]
    pub fn index(&self) -> &Arc<SubscriptionIndex> {
        &self.index
    }

    /// Publish-side API.
    #[must_use]
    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    /// WebSocket settings.
    #[must_use]
    pub fn config(&self) -> &WsConfig {
        &self.config
    }

    /// Asks the admission gate about a pending connection.
    pub async fn admit(&self, ctx: &HandshakeContext) -> Admission {
        if self.is_shutting_down() {
            return Admission::Deny(DenyReason::InternalError);
        }
        let decision = self.gate.admit(ctx).await;
        if let Admission::Deny(reason) = decision {
            tracing::warn!(peer = ?ctx.peer, origin = ?ctx.origin, %reason, code = reason.close_code(), "connection denied");
        }
        decision
    }

    /// Registers an admitted connection.
    ///
    /// The `welcome` frame is queued before the connection becomes visible
    /// to broadcasts, so it is always the first frame the client sees.
    /// Returns the handle and the receiving end of its outbound queue.
    pub fn accept(
        &self,
        peer: Option<SocketAddr>,
    ) -> (Arc<ClientConnection>, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(self.config.outbound_queue_capacity.max(1));
        let conn = Arc::new(ClientConnection::new(
            self.registry.next_id(),
            peer,
            tx,
            self.shutdown.child_token(),
        ));
        let _ = conn.send_message(&ServerMessage::Welcome {
            message: WELCOME_MESSAGE,
        });
        self.registry.register(Arc::clone(&conn));
        tracing::info!(conn_id = %conn.id(), ?peer, "websocket connection established");
        (conn, rx)
    }

    /// Follows `match_id` on behalf of `conn`, applying the configured cap.
    pub fn subscribe(&self, match_id: MatchId, conn: &ClientConnection) -> SubscribeOutcome {
        let limit = (self.config.max_subscriptions > 0).then_some(self.config.max_subscriptions);
        let outcome = self.index.subscribe(match_id, conn, limit);
        tracing::debug!(conn_id = %conn.id(), %match_id, ?outcome, "subscribe");
        outcome
    }

    /// Stops following `match_id` on behalf of `conn`.
    pub fn unsubscribe(&self, match_id: MatchId, conn: &ClientConnection) -> bool {
        let removed = self.index.unsubscribe(match_id, conn);
        tracing::debug!(conn_id = %conn.id(), %match_id, removed, "unsubscribe");
        removed
    }

    /// Terminates a connection. Idempotent; returns `true` only for the
    /// call that actually tore it down.
    pub fn terminate(&self, id: ConnectionId) -> bool {
        let terminated = self.registry.deregister(id).is_some();
        if terminated {
            tracing::info!(conn_id = %id, "websocket connection closed");
        }
        terminated
    }

    /// Starts the liveness monitor; it stops on [`RealtimeHub::shutdown`].
    pub fn spawn_liveness_monitor(&self) -> JoinHandle<()> {
        LivenessMonitor::new(Arc::clone(&self.registry)).spawn(self.shutdown.clone())
    }

    /// Stops the liveness monitor and signals every connection to close.
    pub fn shutdown(&self) {
        if !self.shutdown.is_cancelled() {
            tracing::info!(connections = self.registry.len(), "realtime hub shutting down");
        }
        self.shutdown.cancel();
    }

    /// Returns `true` once shutdown has started.
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Total frames dropped across live connections because their outbound
    /// queue was full.
    #[must_use]
    pub fn dropped_frames(&self) -> u64 {
        let mut total = 0_u64;
        self.registry
            .for_each(|conn| total = total.saturating_add(conn.dropped_frames()));
        total
    }
}
