//! Match DTOs for create and list operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common_dto::{non_negative, required_text};
use crate::domain::{Match, NewMatch};
use crate::error::GatewayError;

/// Request body for `POST /matches`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateMatchRequest {
    /// Sport name.
    pub sport: String,
    /// Home team name.
    pub home_team: String,
    /// Away team name.
    pub away_team: String,
    /// RFC 3339 kick-off time.
    pub start_time: String,
    /// RFC 3339 end time; must be after `startTime`.
    pub end_time: String,
    /// Initial home score (default 0).
    #[serde(default)]
    pub home_score: Option<i64>,
    /// Initial away score (default 0).
    #[serde(default)]
    pub away_score: Option<i64>,
}

impl CreateMatchRequest {
    /// Validates the request and converts it into a [`NewMatch`].
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] describing the first
    /// offending field.
    pub fn validate(self) -> Result<NewMatch, GatewayError> {
        let start_time = parse_timestamp(&self.start_time, "startTime")?;
        let end_time = parse_timestamp(&self.end_time, "endTime")?;
        if end_time <= start_time {
            return Err(GatewayError::InvalidRequest(
                "endTime must be after startTime".to_string(),
            ));
        }
        Ok(NewMatch {
            sport: required_text(self.sport, "sport")?,
            home_team: required_text(self.home_team, "homeTeam")?,
            away_team: required_text(self.away_team, "awayTeam")?,
            start_time,
            end_time: Some(end_time),
            home_score: non_negative(self.home_score.unwrap_or(0), "homeScore")?,
            away_score: non_negative(self.away_score.unwrap_or(0), "awayScore")?,
        })
    }
}

fn parse_timestamp(raw: &str, field: &str) -> Result<DateTime<Utc>, GatewayError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| GatewayError::InvalidRequest(format!("{field} must be an RFC 3339 timestamp")))
}

/// Response body for `POST /matches` (201 Created).
#[derive(Debug, Serialize, ToSchema)]
pub struct MatchResponse {
    /// The created match.
    pub data: Match,
}

/// Response body for `GET /matches`.
#[derive(Debug, Serialize, ToSchema)]
pub struct MatchListResponse {
    /// Matches, newest first.
    pub data: Vec<Match>,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn request() -> CreateMatchRequest {
        CreateMatchRequest {
            sport: "football".to_string(),
            home_team: "Rovers".to_string(),
            away_team: "United".to_string(),
            start_time: "2026-05-01T18:00:00Z".to_string(),
            end_time: "2026-05-01T20:00:00Z".to_string(),
            home_score: None,
            away_score: Some(1),
        }
    }

    #[test]
    fn valid_request_converts() {
        let Ok(new) = request().validate() else {
            panic!("expected valid request");
        };
        assert_eq!(new.home_score, 0);
        assert_eq!(new.away_score, 1);
        assert!(new.end_time.is_some_and(|end| end > new.start_time));
    }

    #[test]
    fn end_before_start_is_rejected() {
        let req = CreateMatchRequest {
            end_time: "2026-05-01T17:00:00Z".to_string(),
            ..request()
        };
        let Err(err) = req.validate() else {
            panic!("expected rejection");
        };
        assert!(err.to_string().contains("endTime must be after startTime"));
    }

    #[test]
    fn bad_timestamp_and_blank_team_are_rejected() {
        let bad_time = CreateMatchRequest {
            start_time: "tomorrow".to_string(),
            ..request()
        };
        assert!(bad_time.validate().is_err());

        let blank = CreateMatchRequest {
            home_team: " ".to_string(),
            ..request()
        };
        assert!(blank.validate().is_err());

        let negative = CreateMatchRequest {
            home_score: Some(-2),
            ..request()
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn deserializes_camel_case() {
        let json = r#"{"sport":"rugby","homeTeam":"A","awayTeam":"B",
            "startTime":"2026-01-01T10:00:00Z","endTime":"2026-01-01T12:00:00Z"}"#;
        let Ok(req) = serde_json::from_str::<CreateMatchRequest>(json) else {
            panic!("expected to deserialize");
        };
        assert_eq!(req.home_team, "A");
        assert!(req.home_score.is_none());
    }
}
