//! Commentary DTOs for create and list operations.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common_dto::{non_negative, required_text};
use crate::domain::{Commentary, MatchId, NewCommentary};
use crate::error::GatewayError;

/// Request body for `POST /matches/{id}/commentary`.
///
/// The match id comes from the path; a `matchId` field in the body is
/// ignored.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentaryRequest {
    /// Match minute.
    #[serde(default)]
    pub minute: Option<i64>,
    /// Ordering key within the same minute.
    pub sequence: i64,
    /// Period label.
    #[serde(default)]
    pub period: Option<String>,
    /// Event kind.
    pub event_type: String,
    /// Player involved.
    #[serde(default)]
    pub actor: Option<String>,
    /// Team involved.
    #[serde(default)]
    pub team: Option<String>,
    /// Human-readable text.
    pub message: String,
    /// Free-form event details.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
    /// Searchable tags.
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl CreateCommentaryRequest {
    /// Validates the request and converts it into a [`NewCommentary`].
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] describing the first
    /// offending field.
    pub fn validate(self, match_id: MatchId) -> Result<NewCommentary, GatewayError> {
        Ok(NewCommentary {
            match_id,
            minute: self
                .minute
                .map(|minute| non_negative(minute, "minute"))
                .transpose()?,
            sequence: non_negative(self.sequence, "sequence")?,
            period: self.period,
            event_type: required_text(self.event_type, "eventType")?,
            actor: self.actor,
            team: self.team,
            message: required_text(self.message, "message")?,
            metadata: self.metadata.map(serde_json::Value::Object),
            tags: self.tags,
        })
    }
}

/// Response body for `POST /matches/{id}/commentary` (201 Created).
#[derive(Debug, Serialize, ToSchema)]
pub struct CommentaryResponse {
    /// The created commentary line.
    pub data: Commentary,
}

/// Response body for `GET /matches/{id}/commentary`.
#[derive(Debug, Serialize, ToSchema)]
pub struct CommentaryListResponse {
    /// Number of lines returned.
    pub count: usize,
    /// Commentary lines, newest first.
    pub data: Vec<Commentary>,
}
