//! Connection admission.
//!
//! The realtime core only consumes an admit/deny decision. Denials are
//! mapped to WebSocket close codes and the connection is closed before it is
//! ever registered.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use dashmap::DashMap;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tokio::time::Instant;

use crate::config::WsConfig;

/// What the gate knows about a pending connection.
#[derive(Debug, Clone, Default)]
pub struct HandshakeContext {
    /// Remote socket address, when the server exposes it.
    pub peer: Option<SocketAddr>,
    /// `Origin` request header.
    pub origin: Option<String>,
    /// `User-Agent` request header.
    pub user_agent: Option<String>,
}

/// Why a connection was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// Too many connection attempts.
    RateLimited,
    /// The client is not allowed to connect.
    Forbidden,
    /// The gate itself failed.
    InternalError,
}

impl DenyReason {
    /// WebSocket close code sent to the client.
    #[must_use]
    pub const fn close_code(self) -> u16 {
        match self {
            Self::RateLimited => 1013,
            Self::Forbidden => 1008,
            Self::InternalError => 1011,
        }
    }

    /// Close reason text sent to the client.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RateLimited => "Rate limit exceeded",
            Self::Forbidden => "Access denied",
            Self::InternalError => "Server security error",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decision returned by an [`AdmissionGate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Register the connection.
    Admit,
    /// Close the connection with the mapped code.
    Deny(DenyReason),
}

/// Decides whether a pending connection may be registered.
///
/// Evaluation may wait (e.g. on an external rate-limit service); the
/// connection is not registered until the returned future resolves.
pub trait AdmissionGate: Send + Sync + fmt::Debug {
    /// Evaluates the handshake context.
    fn admit<'a>(&'a self, ctx: &'a HandshakeContext) -> BoxFuture<'a, Admission>;
}

/// Gate that admits every connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AdmissionGate for AllowAll {
    fn admit<'a>(&'a self, _ctx: &'a HandshakeContext) -> BoxFuture<'a, Admission> {
        async { Admission::Admit }.boxed()
    }
}

/// Handshake counter for one client IP.
#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window handshake limiter keyed by client IP.
#[derive(Debug)]
struct RateLimiter {
    max: u32,
    window: Duration,
    windows: DashMap<IpAddr, Window>,
}

/// Windows kept before expired ones are pruned.
const PRUNE_THRESHOLD: usize = 10_000;

impl RateLimiter {
    fn new(max: u32, window: Duration) -> Self {
        Self {
            max,
            window,
            windows: DashMap::new(),
        }
    }

    /// Counts one attempt from `ip`; returns `false` once over the limit.
    fn check(&self, ip: IpAddr) -> bool {
        let now = Instant::now();
        if self.windows.len() >= PRUNE_THRESHOLD {
            self.windows
                .retain(|_, w| now.duration_since(w.started) < self.window);
        }
        let mut entry = self.windows.entry(ip).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(entry.started) >= self.window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }
        entry.count = entry.count.saturating_add(1);
        entry.count <= self.max
    }
}

/// Gate enforcing an origin allow-list and a per-IP handshake rate limit.
#[derive(Debug)]
pub struct PolicyGate {
    allowed_origins: Vec<String>,
    limiter: Option<RateLimiter>,
}

impl PolicyGate {
    /// Creates a gate. An empty `allowed_origins` admits any origin;
    /// `rate_limit` of `None` disables rate limiting.
    #[must_use]
    pub fn new(allowed_origins: Vec<String>, rate_limit: Option<(u32, Duration)>) -> Self {
        Self {
            allowed_origins,
            limiter: rate_limit.map(|(max, window)| RateLimiter::new(max, window)),
        }
    }

    /// Builds a gate from the WebSocket settings.
    #[must_use]
    pub fn from_config(config: &WsConfig) -> Self {
        let rate_limit = (config.rate_limit_max > 0).then(|| {
            (
                config.rate_limit_max,
                Duration::from_secs(config.rate_limit_window_secs),
            )
        });
        Self::new(config.allowed_origins.clone(), rate_limit)
    }

    fn decide(&self, ctx: &HandshakeContext) -> Admission {
        if !self.allowed_origins.is_empty() {
            let allowed = ctx
                .origin
                .as_deref()
                .is_some_and(|origin| self.allowed_origins.iter().any(|o| o == origin));
            if !allowed {
                return Admission::Deny(DenyReason::Forbidden);
            }
        }
        if let (Some(limiter), Some(peer)) = (&self.limiter, ctx.peer)
            && !limiter.check(peer.ip())
        {
            return Admission::Deny(DenyReason::RateLimited);
        }
        Admission::Admit
    }
}

impl AdmissionGate for PolicyGate {
    fn admit<'a>(&'a self, ctx: &'a HandshakeContext) -> BoxFuture<'a, Admission> {
        async move { self.decide(ctx) }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(ip: [u8; 4], origin: Option<&str>) -> HandshakeContext {
        HandshakeContext {
            peer: Some(SocketAddr::from((ip, 40_000))),
            origin: origin.map(str::to_string),
            user_agent: None,
        }
    }

    #[test]
    fn close_codes_match_reasons() {
        assert_eq!(DenyReason::RateLimited.close_code(), 1013);
        assert_eq!(DenyReason::Forbidden.close_code(), 1008);
        assert_eq!(DenyReason::InternalError.close_code(), 1011);
    }

    #[tokio::test]
    async fn allow_all_admits() {
        assert_eq!(
            AllowAll.admit(&HandshakeContext::default()).await,
            Admission::Admit
        );
    }

    #[tokio::test]
    async fn origin_allow_list() {
        let gate = PolicyGate::new(vec!["https://live.example".to_string()], None);
        assert_eq!(
            gate.admit(&ctx([10, 0, 0, 1], Some("https://live.example"))).await,
            Admission::Admit
        );
        assert_eq!(
            gate.admit(&ctx([10, 0, 0, 1], Some("https://evil.example"))).await,
            Admission::Deny(DenyReason::Forbidden)
        );
        assert_eq!(
            gate.admit(&ctx([10, 0, 0, 1], None)).await,
            Admission::Deny(DenyReason::Forbidden)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_per_ip_and_window() {
        let gate = PolicyGate::new(Vec::new(), Some((2, Duration::from_secs(10))));
        let a = ctx([10, 0, 0, 1], None);
        let b = ctx([10, 0, 0, 2], None);

        assert_eq!(gate.admit(&a).await, Admission::Admit);
        assert_eq!(gate.admit(&a).await, Admission::Admit);
        assert_eq!(gate.admit(&a).await, Admission::Deny(DenyReason::RateLimited));
        assert_eq!(gate.admit(&b).await, Admission::Admit);

        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(gate.admit(&a).await, Admission::Admit);
    }

    #[test]
    fn from_config_disables_limiter_at_zero() {
        let gate = PolicyGate::from_config(&WsConfig::default());
        assert!(gate.limiter.is_none());
        assert!(gate.allowed_origins.is_empty());
    }
}
