//! Gateway configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Missing or unparseable optional values
//! fall back to defaults.

use std::net::SocketAddr;

/// Top-level gateway configuration.
///
/// Loaded once at startup via [`GatewayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:8000`).
    pub listen_addr: SocketAddr,

    /// PostgreSQL connection string. `None` selects the in-memory store.
    pub database_url: Option<String>,

    /// Maximum number of database connections in the pool.
    pub database_max_connections: u32,

    /// Timeout in seconds for acquiring a database connection.
    pub database_connect_timeout_secs: u64,

    /// Emit logs as JSON lines instead of the human-readable format.
    pub log_json: bool,

    /// WebSocket-specific settings.
    pub ws: WsConfig,
}

/// Settings for the realtime WebSocket layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WsConfig {
    /// Largest inbound frame or message accepted, in bytes.
    pub max_payload_bytes: usize,

    /// Capacity of each connection's outbound frame queue. Frames for a
    /// connection whose queue is full are dropped.
    pub outbound_queue_capacity: usize,

    /// Maximum number of matches one connection may follow (0 = unlimited).
    pub max_subscriptions: usize,

    /// Handshakes allowed per client IP per window (0 = no rate limit).
    pub rate_limit_max: u32,

    /// Length of the rate-limit window in seconds.
    pub rate_limit_window_secs: u64,

    /// Origins allowed to open a connection. Empty means any origin.
    pub allowed_origins: Vec<String>,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            max_payload_bytes: 1024 * 1024,
            outbound_queue_capacity: 256,
            max_subscriptions: 0,
            rate_limit_max: 0,
            rate_limit_window_secs: 10,
            allowed_origins: Vec::new(),
        }
    }
}

/// Errors raised while loading [`GatewayConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `LISTEN_ADDR` is not a valid socket address.
    #[error("invalid LISTEN_ADDR `{value}`: {source}")]
    InvalidListenAddr {
        /// The rejected value.
        value: String,
        /// Underlying parse failure.
        source: std::net::AddrParseError,
    },
}

impl GatewayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidListenAddr`] if `LISTEN_ADDR` is set
    /// but cannot be parsed as a [`SocketAddr`].
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let raw_addr = std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
        let listen_addr: SocketAddr = raw_addr
            .parse()
            .map_err(|source| ConfigError::InvalidListenAddr {
                value: raw_addr.clone(),
                source,
            })?;

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let database_max_connections = parse_env("DATABASE_MAX_CONNECTIONS", 10);
        let database_connect_timeout_secs = parse_env("DATABASE_CONNECT_TIMEOUT_SECS", 5);

        let log_json = std::env::var("LOG_FORMAT")
            .is_ok_and(|format| format.eq_ignore_ascii_case("json"));

        let defaults = WsConfig::default();
        let ws = WsConfig {
            max_payload_bytes: parse_env("WS_MAX_PAYLOAD_BYTES", defaults.max_payload_bytes),
            outbound_queue_capacity: parse_env(
                "WS_OUTBOUND_QUEUE_CAPACITY",
                defaults.outbound_queue_capacity,
            )
            .max(1),
            max_subscriptions: parse_env("WS_MAX_SUBSCRIPTIONS", defaults.max_subscriptions),
            rate_limit_max: parse_env("WS_RATE_LIMIT_MAX", defaults.rate_limit_max),
            rate_limit_window_secs: parse_env(
                "WS_RATE_LIMIT_WINDOW_SECS",
                defaults.rate_limit_window_secs,
            )
            .max(1),
            allowed_origins: std::env::var("WS_ALLOWED_ORIGINS")
                .map(|raw| parse_list(&raw))
                .unwrap_or_default(),
        };

        Ok(Self {
            listen_addr,
            database_url,
            database_max_connections,
            database_connect_timeout_secs,
            log_json,
            ws,
        })
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Splits a comma-separated list, trimming entries and dropping empties.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}
