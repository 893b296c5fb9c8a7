//! Match records and their lifecycle status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::MatchId;

/// Lifecycle status of a match, derived from its schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// The match has not started yet.
    Scheduled,
    /// The match is in progress.
    Live,
    /// The match has ended.
    Finished,
}

impl MatchStatus {
    /// Derives the status of a match at instant `now`.
    ///
    /// Before `start` the match is scheduled; at or after `end` it is
    /// finished; anything in between is live. A match without an end time
    /// stays live once started.
    #[must_use]
    pub fn at(start: DateTime<Utc>, end: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        if now < start {
            Self::Scheduled
        } else if end.is_some_and(|end| now >= end) {
            Self::Finished
        } else {
            Self::Live
        }
    }

    /// Returns the status as its wire/storage string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Live => "live",
            Self::Finished => "finished",
        }
    }

    /// Parses the storage string back into a status.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scheduled" => Some(Self::Scheduled),
            "live" => Some(Self::Live),
            "finished" => Some(Self::Finished),
            _ => None,
        }
    }
}

/// A persisted match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    /// Store-assigned identifier.
    #[schema(value_type = i64)]
    pub id: MatchId,
    /// Sport name (e.g. `"football"`).
    pub sport: String,
    /// Home team name.
    pub home_team: String,
    /// Away team name.
    pub away_team: String,
    /// Status at creation time.
    pub status: MatchStatus,
    /// Scheduled kick-off.
    pub start_time: DateTime<Utc>,
    /// Scheduled end, if known.
    pub end_time: Option<DateTime<Utc>>,
    /// Home score.
    pub home_score: i32,
    /// Away score.
    pub away_score: i32,
    /// Server-side creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Validated input for creating a match.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMatch {
    /// Sport name.
    pub sport: String,
    /// Home team name.
    pub home_team: String,
    /// Away team name.
    pub away_team: String,
    /// Scheduled kick-off.
    pub start_time: DateTime<Utc>,
    /// Scheduled end.
    pub end_time: Option<DateTime<Utc>>,
    /// Initial home score.
    pub home_score: i32,
    /// Initial away score.
    pub away_score: i32,
}

impl NewMatch {
    /// Status this match would have if created at `now`.
    #[must_use]
    pub fn status_at(&self, now: DateTime<Utc>) -> MatchStatus {
        MatchStatus::at(self.start_time, self.end_time, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn status_follows_schedule() {
        let now = Utc::now();
        let start = now + Duration::hours(1);
        let end = start + Duration::hours(2);
        assert_eq!(MatchStatus::at(start, Some(end), now), MatchStatus::Scheduled);
        assert_eq!(
            MatchStatus::at(start, Some(end), start + Duration::minutes(5)),
            MatchStatus::Live
        );
        assert_eq!(MatchStatus::at(start, Some(end), end), MatchStatus::Finished);
        assert_eq!(
            MatchStatus::at(start, None, end + Duration::days(3)),
            MatchStatus::Live
        );
    }

    #[test]
    fn status_string_round_trip() {
        for status in [MatchStatus::Scheduled, MatchStatus::Live, MatchStatus::Finished] {
            assert_eq!(MatchStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(MatchStatus::parse("paused"), None);
    }
}
