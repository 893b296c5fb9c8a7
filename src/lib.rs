//! # matchcast-gateway
//!
//! REST API and WebSocket fan-out gateway for live match events and
//! commentary.
//!
//! Matches and commentary lines are written through the REST surface,
//! persisted, and then pushed to WebSocket clients: every client hears about
//! new matches, while commentary only reaches clients subscribed to that
//! match.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler + AdmissionGate (ws/)
//!     │
//!     ├── MatchService (service/)
//!     │       └── Broadcaster ──► SubscriptionIndex ──► ClientConnection queues
//!     │
//!     ├── ConnectionRegistry + LivenessMonitor (ws/)
//!     │
//!     └── MatchStore: PostgreSQL | in-memory (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
pub mod ws;
