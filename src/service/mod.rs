//! Service layer: business logic orchestration.
//!
//! [`MatchService`] coordinates the record store and the realtime
//! broadcast engine for all match and commentary writes.

pub mod match_service;

pub use match_service::MatchService;
