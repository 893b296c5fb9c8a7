//! Broadcast engine and publish-side API.
//!
//! Both delivery modes serialize the payload once and enqueue the shared
//! frame on each target connection without waiting. Connections that are
//! not open, or whose queue is full, are skipped; nothing is reported back
//! to the publisher.

use std::sync::Arc;

use super::client::{ClientConnection, Outbound};
use super::messages::ServerMessage;
use super::registry::ConnectionRegistry;
use super::subscription::SubscriptionIndex;
use crate::domain::{Commentary, Match, MatchId};

/// Fan-out of server messages to registered connections.
#[derive(Debug, Clone)]
pub struct Broadcaster {
    registry: Arc<ConnectionRegistry>,
    index: Arc<SubscriptionIndex>,
}

impl Broadcaster {
    /// Creates a broadcaster over the given registry and index.
    #[must_use]
    pub fn new(registry: Arc<ConnectionRegistry>, index: Arc<SubscriptionIndex>) -> Self {
        Self { registry, index }
    }

    /// Publishes a `match_created` event to every open connection.
    pub fn publish_match_created(&self, record: &Match) {
        let recipients = self.broadcast_all(&ServerMessage::MatchCreated { data: record });
        tracing::info!(match_id = %record.id, recipients, "broadcast match_created");
    }

    /// Publishes a `commentary_created` event to the followers of `match_id`.
    pub fn publish_commentary_created(&self, match_id: MatchId, record: &Commentary) {
        let recipients = self.broadcast_to_subscribers(
            match_id,
            &ServerMessage::CommentaryCreated { data: record },
        );
        tracing::debug!(%match_id, commentary_id = record.id, recipients, "broadcast commentary_created");
    }

    /// Sends `message` to every open connection.
    ///
    /// Returns the number of connections the frame was queued for.
    pub fn broadcast_all(&self, message: &ServerMessage<'_>) -> usize {
        let targets = self.registry.snapshot();
        if targets.is_empty() {
            return 0;
        }
        deliver(message, &targets)
    }

    /// Sends `message` to every open connection following `match_id`.
    ///
    /// No-op if nobody follows the match. Returns the number of connections
    /// the frame was queued for.
    pub fn broadcast_to_subscribers(&self, match_id: MatchId, message: &ServerMessage<'_>) -> usize {
        let ids = self.index.subscribers(match_id);
        if ids.is_empty() {
            return 0;
        }
        let targets: Vec<Arc<ClientConnection>> = ids
            .into_iter()
            .filter_map(|id| self.registry.get(id))
            .collect();
        deliver(message, &targets)
    }
}

/// Serializes once and enqueues the frame on every open target.
fn deliver(message: &ServerMessage<'_>, targets: &[Arc<ClientConnection>]) -> usize {
    let frame = match message.to_frame() {
        Ok(frame) => frame,
        Err(e) => {
            tracing::error!(msg_type = message.type_str(), error = %e, "failed to serialize broadcast");
            return 0;
        }
    };
    targets
        .iter()
        .filter(|conn| conn.is_open())
        .filter(|conn| conn.send(Outbound::Text(frame.clone())).is_ok())
        .count()
}
