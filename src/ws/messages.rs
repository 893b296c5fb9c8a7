//! WebSocket wire messages.
//!
//! Inbound frames are JSON objects carrying a `type` discriminator and a
//! `matchId`. Outbound frames use the same `type` discriminator and are
//! serialized once into a shared [`Utf8Bytes`] buffer so a broadcast can
//! hand the same bytes to every recipient.

use axum::extract::ws::Utf8Bytes;
use serde::{Deserialize, Serialize};

use crate::domain::{Commentary, Match, MatchId};

/// Text of the `welcome` frame sent right after admission.
pub const WELCOME_MESSAGE: &str = "Welcome to the matchcast live feed";

/// Text of the `error` frame sent for unparseable input.
pub const INVALID_JSON_MESSAGE: &str = "Invalid JSON";

/// Text of the `error` frame sent when a connection follows too many matches.
pub const SUBSCRIPTION_LIMIT_MESSAGE: &str = "Subscription limit reached";

/// Control messages a client can send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Start receiving `commentary_created` events for a match.
    Subscribe {
        /// Match to follow.
        #[serde(rename = "matchId")]
        match_id: MatchId,
    },
    /// Stop receiving `commentary_created` events for a match.
    Unsubscribe {
        /// Match to stop following.
        #[serde(rename = "matchId")]
        match_id: MatchId,
    },
}

/// Result of parsing one inbound text frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inbound {
    /// A well-formed control message.
    Command(ClientMessage),
    /// Valid JSON that is not a known control message (unknown `type`,
    /// missing or non-positive-integer `matchId`, ...).
    Unrecognized,
    /// Not JSON at all.
    Malformed,
}

/// Classifies an inbound text frame.
#[must_use]
pub fn parse_client_message(text: &str) -> Inbound {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(text) else {
        return Inbound::Malformed;
    };
    match serde_json::from_value::<ClientMessage>(value) {
        Ok(message) => Inbound::Command(message),
        Err(_) => Inbound::Unrecognized,
    }
}

/// Messages the server sends to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage<'a> {
    /// Handshake completion; always the first frame on a connection.
    Welcome {
        /// Greeting text.
        message: &'a str,
    },
    /// Acknowledges a `subscribe` request.
    Subscribed {
        /// Match now followed.
        #[serde(rename = "matchId")]
        match_id: MatchId,
    },
    /// Acknowledges an `unsubscribe` request.
    Unsubscribed {
        /// Match no longer followed.
        #[serde(rename = "matchId")]
        match_id: MatchId,
    },
    /// Reports a rejected inbound frame.
    Error {
        /// Human-readable reason.
        message: &'a str,
    },
    /// A match was created; sent to every connection.
    MatchCreated {
        /// The new match.
        data: &'a Match,
    },
    /// A commentary line was posted; sent to the match's subscribers.
    CommentaryCreated {
        /// The new commentary line.
        data: &'a Commentary,
    },
}

impl ServerMessage<'_> {
    /// Returns the `type` discriminator as a static string slice.
    #[must_use]
    pub const fn type_str(&self) -> &'static str {
        match self {
            Self::Welcome { .. } => "welcome",
            Self::Subscribed { .. } => "subscribed",
            Self::Unsubscribed { .. } => "unsubscribed",
            Self::Error { .. } => "error",
            Self::MatchCreated { .. } => "match_created",
            Self::CommentaryCreated { .. } => "commentary_created",
        }
    }

    /// Serializes the message into a frame that can be cloned cheaply for
    /// every recipient.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`serde_json::Error`] if serialization fails.
    pub fn to_frame(&self) -> Result<Utf8Bytes, serde_json::Error> {
        serde_json::to_string(self).map(Utf8Bytes::from)
    }
}
