//! Subscription index: match id → connections following that match.
//!
//! The index is sharded by match id, so subscribing to or broadcasting for
//! one match never contends with another match living on a different shard.
//! Each connection additionally keeps its own set of followed matches (see
//! [`ClientConnection`]). Both sides are updated while the connection's set
//! is locked, which makes every operation on a given (match, connection)
//! pair linearizable. Lock order is always connection set → index shard.

use std::collections::HashSet;

use dashmap::DashMap;

use super::client::{ClientConnection, ConnectionId};
use crate::domain::MatchId;

/// Outcome of [`SubscriptionIndex::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    /// The connection now follows the match.
    Subscribed,
    /// The connection already followed the match; nothing changed.
    AlreadySubscribed,
    /// The per-connection cap was reached; nothing changed.
    LimitReached,
    /// The connection has been cleaned up and accepts no subscriptions.
    Closed,
}

impl SubscribeOutcome {
    /// Returns `true` if the connection follows the match afterwards.
    #[must_use]
    pub const fn is_subscribed(self) -> bool {
        matches!(self, Self::Subscribed | Self::AlreadySubscribed)
    }
}

/// Reverse index used by targeted broadcasts.
///
/// Invariants:
/// - a match id is a key iff at least one connection follows it;
/// - connection C is listed under match M iff M is in C's own set.
#[derive(Debug, Default)]
pub struct SubscriptionIndex {
    entries: DashMap<MatchId, HashSet<ConnectionId>>,
}

impl SubscriptionIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `conn` to the followers of `match_id`.
    ///
    /// `limit` caps how many matches one connection may follow; `None`
    /// means unlimited. Subscribing twice is a no-op.
    pub fn subscribe(
        &self,
        match_id: MatchId,
        conn: &ClientConnection,
        limit: Option<usize>,
    ) -> SubscribeOutcome {
        let mut own = conn.lock_subscriptions();
        if own.sealed {
            return SubscribeOutcome::Closed;
        }
        if own.matches.contains(&match_id) {
            return SubscribeOutcome::AlreadySubscribed;
        }
        if let Some(max) = limit
            && own.matches.len() >= max
        {
            return SubscribeOutcome::LimitReached;
        }
        own.matches.insert(match_id);
        self.entries.entry(match_id).or_default().insert(conn.id());
        SubscribeOutcome::Subscribed
    }

    /// Removes `conn` from the followers of `match_id`.
    ///
    /// Returns `true` if the connection was following the match.
    /// Unsubscribing when not subscribed is a no-op.
    pub fn unsubscribe(&self, match_id: MatchId, conn: &ClientConnection) -> bool {
        let mut own = conn.lock_subscriptions();
        let removed = own.matches.remove(&match_id);
        if removed {
            self.detach(match_id, conn.id());
        }
        removed
    }

    /// Removes `conn` from every match it follows and seals its set so no
    /// subscription can race in afterwards. Returns how many matches were
    /// dropped.
    pub fn cleanup_all(&self, conn: &ClientConnection) -> usize {
        let mut own = conn.lock_subscriptions();
        own.sealed = true;
        let count = own.matches.len();
        for match_id in own.matches.drain() {
            self.detach(match_id, conn.id());
        }
        count
    }

    /// Snapshot of the connections following `match_id`.
    #[must_use]
    pub fn subscribers(&self, match_id: MatchId) -> Vec<ConnectionId> {
        self.entries
            .get(&match_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Returns `true` if `conn_id` is listed under `match_id`.
    #[must_use]
    pub fn contains(&self, match_id: MatchId, conn_id: ConnectionId) -> bool {
        self.entries
            .get(&match_id)
            .is_some_and(|set| set.contains(&conn_id))
    }

    /// Returns `true` if `match_id` is a key of the index.
    #[must_use]
    pub fn has_subscribers(&self, match_id: MatchId) -> bool {
        self.entries.contains_key(&match_id)
    }

    /// Number of matches with at least one follower.
    #[must_use]
    pub fn match_count(&self) -> usize {
        self.entries.len()
    }

    /// Removes `conn_id` under `match_id`, dropping the key once empty.
    fn detach(&self, match_id: MatchId, conn_id: ConnectionId) {
        self.entries.remove_if_mut(&match_id, |_, set| {
            set.remove(&conn_id);
            set.is_empty()
        });
    }
}
