//! Per-connection handle shared by the registry, the subscription index,
//! the liveness monitor and the broadcast engine.
//!
//! A [`ClientConnection`] never owns the socket. The socket lives in the
//! connection task, which drains the bounded outbound queue fed by
//! [`ClientConnection::send`]. Everything else only ever talks to the
//! handle, so a stale handle held by an in-flight broadcast is harmless.

use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};

use axum::extract::ws::Utf8Bytes;
use parking_lot::{Mutex, MutexGuard};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Notify, mpsc};
use tokio_util::sync::CancellationToken;

use super::messages::ServerMessage;
use crate::domain::MatchId;

/// Opaque, process-unique connection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Wraps a raw counter value.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw counter value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Writable state of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    /// Frames are accepted.
    Open = 0,
    /// Termination started; frames are skipped.
    Closing = 1,
    /// Fully torn down.
    Closed = 2,
}

impl ConnectionState {
    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Open,
            1 => Self::Closing,
            _ => Self::Closed,
        }
    }
}

/// A frame queued for the connection's writer.
///
/// Liveness probes do not go through the queue; see
/// [`ClientConnection::request_probe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Serialized JSON message.
    Text(Utf8Bytes),
}

/// Why a frame did not reach the outbound queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendError {
    /// The connection is closing or closed.
    NotOpen,
    /// The outbound queue is full; the frame was dropped.
    QueueFull,
}

/// The connection's own view of what it follows.
#[derive(Debug, Default)]
pub(crate) struct SubscriptionSet {
    pub(crate) matches: HashSet<MatchId>,
    /// Set once disconnect cleanup has run; no further subscriptions are
    /// accepted afterwards.
    pub(crate) sealed: bool,
}

/// Shared handle to one accepted WebSocket connection.
#[derive(Debug)]
pub struct ClientConnection {
    id: ConnectionId,
    peer: Option<SocketAddr>,
    alive: AtomicBool,
    state: AtomicU8,
    dropped_frames: AtomicU64,
    subscriptions: Mutex<SubscriptionSet>,
    outbound: mpsc::Sender<Outbound>,
    probe: Notify,
    cancel: CancellationToken,
}

impl ClientConnection {
    /// Creates an open, alive connection handle.
    ///
    /// `cancel` is fired when the connection is terminated so that the
    /// connection task drops its socket.
    #[must_use]
    pub fn new(
        id: ConnectionId,
        peer: Option<SocketAddr>,
        outbound: mpsc::Sender<Outbound>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            id,
            peer,
            alive: AtomicBool::new(true),
            state: AtomicU8::new(ConnectionState::Open as u8),
            dropped_frames: AtomicU64::new(0),
            subscriptions: Mutex::new(SubscriptionSet::default()),
            outbound,
            probe: Notify::new(),
            cancel,
        }
    }

    /// Connection handle.
    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// Remote address, when known.
    #[must_use]
    pub const fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// Current writable state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Returns `true` while frames are accepted.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Moves an open connection to `Closing`. Returns `false` if it was
    /// already closing or closed.
    pub fn begin_close(&self) -> bool {
        self.state
            .compare_exchange(
                ConnectionState::Open as u8,
                ConnectionState::Closing as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Marks the connection closed and signals its task to stop.
    pub fn finish_close(&self) {
        self.state
            .store(ConnectionState::Closed as u8, Ordering::Release);
        self.cancel.cancel();
    }

    /// Token cancelled when the connection is terminated.
    #[must_use]
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Records a probe acknowledgment.
    pub fn mark_alive(&self) {
        self.alive.store(true, Ordering::Release);
    }

    /// Returns the current liveness flag without changing it.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Starts a probe cycle: flips the flag to "unconfirmed" and returns
    /// whether the previous cycle's probe was acknowledged.
    pub fn begin_probe_cycle(&self) -> bool {
        self.alive.swap(false, Ordering::AcqRel)
    }

    /// Asks the connection task to send a ping.
    ///
    /// The request bypasses the outbound queue, so a backed-up queue cannot
    /// hold a probe back. Repeated requests before the writer picks one up
    /// collapse into a single ping. Returns `false` if the connection is not
    /// open.
    pub fn request_probe(&self) -> bool {
        if !self.is_open() {
            return false;
        }
        self.probe.notify_one();
        true
    }

    /// Resolves once a probe has been requested.
    pub async fn probe_requested(&self) {
        self.probe.notified().await;
    }

    /// Number of frames dropped because the outbound queue was full.
    #[must_use]
    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames.load(Ordering::Relaxed)
    }

    /// Snapshot of the matches this connection follows.
    #[must_use]
    pub fn subscriptions(&self) -> Vec<MatchId> {
        let mut ids: Vec<MatchId> = self.subscriptions.lock().matches.iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Returns `true` if the connection follows `match_id`.
    #[must_use]
    pub fn is_subscribed(&self, match_id: MatchId) -> bool {
        self.subscriptions.lock().matches.contains(&match_id)
    }

    pub(crate) fn lock_subscriptions(&self) -> MutexGuard<'_, SubscriptionSet> {
        self.subscriptions.lock()
    }

    /// Queues a frame without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::NotOpen`] if the connection is not open and
    /// [`SendError::QueueFull`] if the writer has fallen behind.
    pub fn send(&self, frame: Outbound) -> Result<(), SendError> {
        if !self.is_open() {
            return Err(SendError::NotOpen);
        }
        match self.outbound.try_send(frame) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                let dropped = self.dropped_frames.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::warn!(conn_id = %self.id, dropped, "outbound queue full, frame dropped");
                Err(SendError::QueueFull)
            }
            Err(TrySendError::Closed(_)) => Err(SendError::NotOpen),
        }
    }

    /// Serializes and queues a message addressed to this connection only.
    ///
    /// # Errors
    ///
    /// Same as [`ClientConnection::send`]; serialization failures are
    /// logged and reported as [`SendError::NotOpen`].
    pub fn send_message(&self, message: &ServerMessage<'_>) -> Result<(), SendError> {
        match message.to_frame() {
            Ok(frame) => self.send(Outbound::Text(frame)),
            Err(e) => {
                tracing::error!(conn_id = %self.id, msg_type = message.type_str(), error = %e, "failed to serialize message");
                Err(SendError::NotOpen)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use futures_util::FutureExt;

    use super::*;

    fn make_connection(capacity: usize) -> (ClientConnection, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(capacity);
        let conn = ClientConnection::new(
            ConnectionId::from_raw(1),
            None,
            tx,
            CancellationToken::new(),
        );
        (conn, rx)
    }

    #[test]
    fn new_connection_is_open_and_alive() {
        let (conn, _rx) = make_connection(4);
        assert!(conn.is_open());
        assert!(conn.is_alive());
        assert!(conn.subscriptions().is_empty());
        assert_eq!(conn.id().to_string(), "conn-1");
    }

    #[test]
    fn probe_cycle_reports_previous_flag() {
        let (conn, _rx) = make_connection(4);
        assert!(conn.begin_probe_cycle());
        assert!(!conn.is_alive());
        assert!(!conn.begin_probe_cycle());
        conn.mark_alive();
        assert!(conn.begin_probe_cycle());
    }

    fn text(raw: &'static str) -> Outbound {
        Outbound::Text(Utf8Bytes::from_static(raw))
    }

    #[test]
    fn send_queues_in_order() {
        let (conn, mut rx) = make_connection(4);
        assert_eq!(conn.send(text("a")), Ok(()));
        assert_eq!(conn.send(text("b")), Ok(()));
        assert_eq!(rx.try_recv().ok(), Some(text("a")));
        assert_eq!(rx.try_recv().ok(), Some(text("b")));
    }

    #[test]
    fn full_queue_drops_and_counts() {
        let (conn, _rx) = make_connection(1);
        assert_eq!(conn.send(text("a")), Ok(()));
        assert_eq!(conn.send(text("b")), Err(SendError::QueueFull));
        assert_eq!(conn.dropped_frames(), 1);
    }

    #[test]
    fn probe_request_bypasses_a_full_queue() {
        let (conn, _rx) = make_connection(1);
        assert_eq!(conn.send(text("a")), Ok(()));
        assert!(conn.probe_requested().now_or_never().is_none());

        assert!(conn.request_probe());
        assert!(conn.request_probe());
        assert!(conn.probe_requested().now_or_never().is_some());
        // two requests collapse into one ping
        assert!(conn.probe_requested().now_or_never().is_none());
    }

    #[test]
    fn closing_connection_rejects_frames() {
        let (conn, mut rx) = make_connection(4);
        assert!(conn.begin_close());
        assert!(!conn.begin_close());
        assert_eq!(conn.state(), ConnectionState::Closing);
        assert_eq!(conn.send(text("late")), Err(SendError::NotOpen));
        assert!(!conn.request_probe());
        assert!(rx.try_recv().is_err());

        conn.finish_close();
        assert_eq!(conn.state(), ConnectionState::Closed);
        assert!(conn.cancel_token().is_cancelled());
    }
}
