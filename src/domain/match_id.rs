//! Type-safe match identifier.
//!
//! [`MatchId`] is a newtype wrapper around a positive `i64`. It is the
//! primary key of a stored match, the foreign key of every commentary line,
//! and the key of the WebSocket subscription index.

use std::fmt;
use std::num::NonZeroI64;

use serde::{Deserialize, Deserializer, Serialize};

/// Identifier of a match.
///
/// Always strictly positive. Deserialization rejects zero, negative,
/// fractional and non-numeric values, so a parsed `MatchId` can be used as
/// a subscription key without further checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct MatchId(NonZeroI64);

impl MatchId {
    /// Creates a `MatchId` from a raw integer.
    ///
    /// Returns `None` if `raw` is zero or negative.
    #[must_use]
    pub fn new(raw: i64) -> Option<Self> {
        if raw > 0 {
            NonZeroI64::new(raw).map(Self)
        } else {
            None
        }
    }

    /// Returns the raw integer value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0.get()
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<MatchId> for i64 {
    fn from(id: MatchId) -> Self {
        id.get()
    }
}

impl TryFrom<i64> for MatchId {
    type Error = i64;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        Self::new(raw).ok_or(raw)
    }
}

impl<'de> Deserialize<'de> for MatchId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        Self::new(raw)
            .ok_or_else(|| serde::de::Error::custom(format!("match id must be positive, got {raw}")))
    }
}
