//! WebSocket layer: connection lifecycle, subscriptions, liveness and
//! broadcast fan-out.
//!
//! The WebSocket endpoint at `/ws` lets clients follow individual matches.
//! Every admitted connection receives `match_created` events; connections
//! that subscribed to a match also receive its `commentary_created` events.

pub mod admission;
pub mod broadcast;
pub mod client;
pub mod connection;
pub mod handler;
pub mod hub;
pub mod liveness;
pub mod messages;
pub mod registry;
pub mod subscription;

pub use admission::{Admission, AdmissionGate, AllowAll, DenyReason, HandshakeContext, PolicyGate};
pub use broadcast::Broadcaster;
pub use client::{ClientConnection, ConnectionId, ConnectionState};
pub use hub::RealtimeHub;
pub use liveness::{LivenessMonitor, PROBE_INTERVAL};
pub use subscription::{SubscribeOutcome, SubscriptionIndex};
