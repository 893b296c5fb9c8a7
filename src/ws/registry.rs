//! Registry of every admitted WebSocket connection.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use super::client::{ClientConnection, ConnectionId};
use super::subscription::SubscriptionIndex;

/// Concurrent map of live connections keyed by [`ConnectionId`].
///
/// Deregistration is the single point where a connection is torn down: the
/// caller that actually removes the entry runs subscription cleanup and
/// cancels the connection task. Every other caller gets `None`, which makes
/// termination idempotent even when a transport error races a liveness
/// eviction.
#[derive(Debug)]
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, Arc<ClientConnection>>,
    next_id: AtomicU64,
    index: Arc<SubscriptionIndex>,
}

impl ConnectionRegistry {
    /// Creates an empty registry that cleans up `index` on deregistration.
    #[must_use]
    pub fn new(index: Arc<SubscriptionIndex>) -> Self {
        Self {
            connections: DashMap::new(),
            next_id: AtomicU64::new(1),
            index,
        }
    }

    /// Allocates a fresh connection handle.
    pub fn next_id(&self) -> ConnectionId {
        ConnectionId::from_raw(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Adds an admitted connection and returns its handle.
    pub fn register(&self, conn: Arc<ClientConnection>) -> ConnectionId {
        let id = conn.id();
        self.connections.insert(id, conn);
        tracing::debug!(conn_id = %id, total = self.connections.len(), "connection registered");
        id
    }

    /// Removes a connection, purges its subscriptions and signals its task.
    ///
    /// Returns the removed handle, or `None` if it was already gone.
    pub fn deregister(&self, id: ConnectionId) -> Option<Arc<ClientConnection>> {
        let (_, conn) = self.connections.remove(&id)?;
        conn.begin_close();
        let dropped = self.index.cleanup_all(&conn);
        conn.finish_close();
        tracing::debug!(conn_id = %id, subscriptions = dropped, total = self.connections.len(), "connection deregistered");
        Some(conn)
    }

    /// Looks up a live connection.
    #[must_use]
    pub fn get(&self, id: ConnectionId) -> Option<Arc<ClientConnection>> {
        self.connections.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Snapshot of all live connections.
    ///
    /// Shard locks are released before the snapshot is returned, so callers
    /// may deregister while iterating it.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<ClientConnection>> {
        self.connections
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Calls `f` on every live connection (over a snapshot).
    pub fn for_each(&self, mut f: impl FnMut(&Arc<ClientConnection>)) {
        for conn in self.snapshot() {
            f(&conn);
        }
    }

    /// Number of live connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Returns `true` if no connection is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
