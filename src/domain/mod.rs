//! Domain layer: match and commentary records.
//!
//! These are the records the storage layer persists and the realtime layer
//! fans out to WebSocket clients.

pub mod commentary;
pub mod match_id;
pub mod match_record;

pub use commentary::{Commentary, NewCommentary};
pub use match_id::MatchId;
pub use match_record::{Match, MatchStatus, NewMatch};
