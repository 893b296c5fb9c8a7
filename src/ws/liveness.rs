//! Periodic liveness probing.
//!
//! Each cycle first evicts connections that never acknowledged the previous
//! cycle's probe, then marks the survivors unconfirmed and pings them. A
//! silent connection is therefore evicted after missing two consecutive
//! windows, never after one.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::registry::ConnectionRegistry;

/// Interval between probe cycles.
pub const PROBE_INTERVAL: Duration = Duration::from_secs(30);

/// Counts from one probe cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Connections pinged this cycle.
    pub probed: usize,
    /// Connections terminated for missing the previous probe.
    pub evicted: usize,
}

/// Probes every registered connection on a fixed period.
#[derive(Debug)]
pub struct LivenessMonitor {
    registry: Arc<ConnectionRegistry>,
    interval: Duration,
}

impl LivenessMonitor {
    /// Creates a monitor running every [`PROBE_INTERVAL`].
    #[must_use]
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self::with_interval(registry, PROBE_INTERVAL)
    }

    /// Creates a monitor with a custom period.
    #[must_use]
    pub fn with_interval(registry: Arc<ConnectionRegistry>, interval: Duration) -> Self {
        Self { registry, interval }
    }

    /// Runs one probe cycle over every registered connection.
    pub fn sweep(&self) -> SweepReport {
        let mut report = SweepReport::default();
        for conn in self.registry.snapshot() {
            if !conn.begin_probe_cycle() {
                if self.registry.deregister(conn.id()).is_some() {
                    report.evicted += 1;
                    tracing::warn!(conn_id = %conn.id(), peer = ?conn.peer(), "liveness probe unanswered, terminating");
                }
                continue;
            }
            if conn.request_probe() {
                report.probed += 1;
            }
        }
        if report.evicted > 0 {
            tracing::info!(probed = report.probed, evicted = report.evicted, "liveness sweep");
        } else {
            tracing::trace!(probed = report.probed, "liveness sweep");
        }
        report
    }

    /// Spawns the probe loop. It stops as soon as `shutdown` is cancelled.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    async fn run(self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::debug!(interval_secs = self.interval.as_secs(), "liveness monitor started");
        loop {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    self.sweep();
                }
            }
        }
        tracing::debug!("liveness monitor stopped");
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use axum::extract::ws::Utf8Bytes;
    use futures_util::FutureExt;
    use tokio::sync::mpsc;

    use super::*;
    use crate::ws::client::Outbound;
    use crate::domain::MatchId;
    use crate::ws::client::ClientConnection;
    use crate::ws::subscription::SubscriptionIndex;

    struct Fixture {
        index: Arc<SubscriptionIndex>,
        registry: Arc<ConnectionRegistry>,
    }

    fn fixture() -> Fixture {
        let index = Arc::new(SubscriptionIndex::new());
        let registry = Arc::new(ConnectionRegistry::new(Arc::clone(&index)));
        Fixture { index, registry }
    }

    fn admit(registry: &ConnectionRegistry) -> (Arc<ClientConnection>, mpsc::Receiver<Outbound>) {
        admit_with_capacity(registry, 16)
    }

    fn admit_with_capacity(
        registry: &ConnectionRegistry,
        capacity: usize,
    ) -> (Arc<ClientConnection>, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(capacity);
        let conn = Arc::new(ClientConnection::new(
            registry.next_id(),
            None,
            tx,
            CancellationToken::new(),
        ));
        registry.register(Arc::clone(&conn));
        (conn, rx)
    }

    #[test]
    fn silent_connection_survives_one_cycle_and_dies_on_the_second() {
        let fx = fixture();
        let (conn, _rx) = admit(&fx.registry);
        let monitor = LivenessMonitor::new(Arc::clone(&fx.registry));

        let first = monitor.sweep();
        assert_eq!(first, SweepReport { probed: 1, evicted: 0 });
        assert!(conn.probe_requested().now_or_never().is_some());
        assert!(fx.registry.get(conn.id()).is_some());

        let second = monitor.sweep();
        assert_eq!(second, SweepReport { probed: 0, evicted: 1 });
        assert!(fx.registry.get(conn.id()).is_none());
        assert!(conn.cancel_token().is_cancelled());
    }

    #[test]
    fn full_outbound_queue_still_gets_probed() {
        let fx = fixture();
        let (conn, _rx) = admit_with_capacity(&fx.registry, 1);
        assert!(conn.send(Outbound::Text(Utf8Bytes::from_static("backlog"))).is_ok());
        let monitor = LivenessMonitor::new(Arc::clone(&fx.registry));

        let first = monitor.sweep();
        assert_eq!(first, SweepReport { probed: 1, evicted: 0 });
        assert!(conn.probe_requested().now_or_never().is_some());

        // the client answers the ping even though its queue is still full
        conn.mark_alive();
        let second = monitor.sweep();
        assert_eq!(second, SweepReport { probed: 1, evicted: 0 });
        assert!(fx.registry.get(conn.id()).is_some());

        let third = monitor.sweep();
        assert_eq!(third, SweepReport { probed: 0, evicted: 1 });
    }

    #[test]
    fn acknowledged_probe_keeps_connection() {
        let fx = fixture();
        let (conn, _rx) = admit(&fx.registry);
        let monitor = LivenessMonitor::new(Arc::clone(&fx.registry));

        for _ in 0..5 {
            monitor.sweep();
            conn.mark_alive();
        }
        assert!(fx.registry.get(conn.id()).is_some());
    }

    #[test]
    fn eviction_purges_subscriptions() {
        let fx = fixture();
        let (conn, _rx) = admit(&fx.registry);
        let Some(m) = MatchId::new(4) else {
            panic!("valid id");
        };
        fx.index.subscribe(m, &conn, None);
        let monitor = LivenessMonitor::new(Arc::clone(&fx.registry));

        monitor.sweep();
        monitor.sweep();
        assert!(!fx.index.has_subscribers(m));
    }

    #[tokio::test(start_paused = true)]
    async fn spawned_monitor_evicts_within_two_intervals() {
        let fx = fixture();
        let (conn, _rx) = admit(&fx.registry);
        let shutdown = CancellationToken::new();
        let handle = LivenessMonitor::new(Arc::clone(&fx.registry)).spawn(shutdown.clone());

        tokio::time::sleep(PROBE_INTERVAL - Duration::from_secs(1)).await;
        assert!(conn.probe_requested().now_or_never().is_none());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(conn.probe_requested().now_or_never().is_some());
        assert!(fx.registry.get(conn.id()).is_some());

        tokio::time::sleep(PROBE_INTERVAL).await;
        assert!(fx.registry.get(conn.id()).is_none());

        shutdown.cancel();
        assert!(handle.await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn no_probes_after_shutdown() {
        let fx = fixture();
        let (conn, _rx) = admit(&fx.registry);
        let shutdown = CancellationToken::new();
        let handle = LivenessMonitor::new(Arc::clone(&fx.registry)).spawn(shutdown.clone());

        shutdown.cancel();
        assert!(handle.await.is_ok());
        tokio::time::sleep(PROBE_INTERVAL * 3).await;
        assert!(conn.probe_requested().now_or_never().is_none());
        assert_eq!(fx.registry.len(), 1);
    }
}
