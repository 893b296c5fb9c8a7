//! Commentary lines attached to a match.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::MatchId;

/// A persisted commentary line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Commentary {
    /// Store-assigned identifier.
    pub id: i64,
    /// Match this line belongs to.
    #[schema(value_type = i64)]
    pub match_id: MatchId,
    /// Match minute, if applicable.
    pub minute: Option<i32>,
    /// Ordering key within the same minute.
    pub sequence: i32,
    /// Period label (e.g. `"H1"`, `"Q3"`, `"OT"`).
    pub period: Option<String>,
    /// Event kind (e.g. `"goal"`, `"foul"`).
    pub event_type: String,
    /// Player involved.
    pub actor: Option<String>,
    /// Team involved.
    pub team: Option<String>,
    /// Human-readable text.
    pub message: String,
    /// Free-form event details.
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<serde_json::Value>,
    /// Searchable tags.
    pub tags: Option<Vec<String>>,
    /// Server-side creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Validated input for creating a commentary line.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCommentary {
    /// Target match.
    pub match_id: MatchId,
    /// Match minute.
    pub minute: Option<i32>,
    /// Ordering key.
    pub sequence: i32,
    /// Period label.
    pub period: Option<String>,
    /// Event kind.
    pub event_type: String,
    /// Player involved.
    pub actor: Option<String>,
    /// Team involved.
    pub team: Option<String>,
    /// Human-readable text.
    pub message: String,
    /// Free-form event details.
    pub metadata: Option<serde_json::Value>,
    /// Searchable tags.
    pub tags: Option<Vec<String>>,
}
