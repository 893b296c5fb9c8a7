//! In-memory record store used when no database is configured and in tests.

use std::collections::BTreeMap;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::{Commentary, Match, MatchId, NewCommentary, NewMatch};
use crate::error::GatewayError;

#[derive(Debug, Default)]
struct Tables {
    matches: BTreeMap<MatchId, Match>,
    commentary: Vec<Commentary>,
    last_match_id: i64,
    last_commentary_id: i64,
}

/// Process-local store backed by a single `RwLock`.
///
/// Ids are assigned sequentially, so id order equals creation order.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a match and returns the stored record.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Internal`] if the id sequence overflows.
    pub async fn create_match(&self, new: NewMatch) -> Result<Match, GatewayError> {
        let mut tables = self.tables.write().await;
        let raw = tables.last_match_id.saturating_add(1);
        let id = MatchId::new(raw)
            .ok_or_else(|| GatewayError::Internal("match id sequence exhausted".to_string()))?;
        tables.last_match_id = raw;

        let now = Utc::now();
        let record = Match {
            id,
            status: new.status_at(now),
            sport: new.sport,
            home_team: new.home_team,
            away_team: new.away_team,
            start_time: new.start_time,
            end_time: new.end_time,
            home_score: new.home_score,
            away_score: new.away_score,
            created_at: now,
        };
        tables.matches.insert(id, record.clone());
        Ok(record)
    }

    /// Returns up to `limit` matches, newest first.
    pub async fn list_matches(&self, limit: usize) -> Vec<Match> {
        let tables = self.tables.read().await;
        tables.matches.values().rev().take(limit).cloned().collect()
    }

    /// Inserts a commentary line for an existing match.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MatchNotFound`] if the match does not exist.
    pub async fn create_commentary(&self, new: NewCommentary) -> Result<Commentary, GatewayError> {
        let mut tables = self.tables.write().await;
        if !tables.matches.contains_key(&new.match_id) {
            return Err(GatewayError::MatchNotFound(new.match_id));
        }
        tables.last_commentary_id = tables.last_commentary_id.saturating_add(1);
        let record = Commentary {
            id: tables.last_commentary_id,
            match_id: new.match_id,
            minute: new.minute,
            sequence: new.sequence,
            period: new.period,
            event_type: new.event_type,
            actor: new.actor,
            team: new.team,
            message: new.message,
            metadata: new.metadata,
            tags: new.tags,
            created_at: Utc::now(),
        };
        tables.commentary.push(record.clone());
        Ok(record)
    }

    /// Returns up to `limit` commentary lines of a match, newest first.
    pub async fn list_commentary(&self, match_id: MatchId, limit: usize) -> Vec<Commentary> {
        let tables = self.tables.read().await;
        tables
            .commentary
            .iter()
            .rev()
            .filter(|c| c.match_id == match_id)
            .take(limit)
            .cloned()
            .collect()
    }
}
