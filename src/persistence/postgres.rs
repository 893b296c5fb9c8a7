//! PostgreSQL implementation of the record store.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{Commentary, Match, MatchId, MatchStatus, NewCommentary, NewMatch};
use crate::error::GatewayError;

type MatchRow = (
    i64,
    String,
    String,
    String,
    String,
    DateTime<Utc>,
    Option<DateTime<Utc>>,
    i32,
    i32,
    DateTime<Utc>,
);

type CommentaryRow = (
    i64,
    i64,
    Option<i32>,
    i32,
    Option<String>,
    String,
    Option<String>,
    Option<String>,
    String,
    Option<serde_json::Value>,
    Option<Vec<String>>,
    DateTime<Utc>,
);

const MATCH_COLUMNS: &str = "id, sport, home_team, away_team, status, start_time, end_time, \
     home_score, away_score, created_at";

const COMMENTARY_COLUMNS: &str = "id, match_id, minute, sequence, period, event_type, actor, \
     team, message, metadata, tags, created_at";

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), GatewayError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| GatewayError::PersistenceError(e.to_string()))
    }

    /// Inserts a match and returns the stored record.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn create_match(&self, new: NewMatch) -> Result<Match, GatewayError> {
        let status = new.status_at(Utc::now());
        let row = sqlx::query_as::<_, MatchRow>(&format!(
            "INSERT INTO matches (sport, home_team, away_team, status, start_time, end_time, \
             home_score, away_score) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {MATCH_COLUMNS}"
        ))
        .bind(&new.sport)
        .bind(&new.home_team)
        .bind(&new.away_team)
        .bind(status.as_str())
        .bind(new.start_time)
        .bind(new.end_time)
        .bind(new.home_score)
        .bind(new.away_score)
        .fetch_one(&self.pool)
        .await
        .map_err(persistence_error)?;

        match_from_row(row)
    }

    /// Returns up to `limit` matches, newest first.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn list_matches(&self, limit: usize) -> Result<Vec<Match>, GatewayError> {
        let rows = sqlx::query_as::<_, MatchRow>(&format!(
            "SELECT {MATCH_COLUMNS} FROM matches ORDER BY created_at DESC, id DESC LIMIT $1"
        ))
        .bind(to_sql_limit(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(persistence_error)?;

        rows.into_iter().map(match_from_row).collect()
    }

    /// Inserts a commentary line.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MatchNotFound`] on a foreign-key violation
    /// and [`GatewayError::PersistenceError`] on other database failures.
    pub async fn create_commentary(&self, new: NewCommentary) -> Result<Commentary, GatewayError> {
        let match_id = new.match_id;
        let row = sqlx::query_as::<_, CommentaryRow>(&format!(
            "INSERT INTO commentary (match_id, minute, sequence, period, event_type, actor, team, \
             message, metadata, tags) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {COMMENTARY_COLUMNS}"
        ))
        .bind(match_id.get())
        .bind(new.minute)
        .bind(new.sequence)
        .bind(new.period)
        .bind(new.event_type)
        .bind(new.actor)
        .bind(new.team)
        .bind(new.message)
        .bind(new.metadata)
        .bind(new.tags)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                GatewayError::MatchNotFound(match_id)
            }
            other => persistence_error(other),
        })?;

        commentary_from_row(row)
    }

    /// Returns up to `limit` commentary lines of a match, newest first.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn list_commentary(
        &self,
        match_id: MatchId,
        limit: usize,
    ) -> Result<Vec<Commentary>, GatewayError> {
        let rows = sqlx::query_as::<_, CommentaryRow>(&format!(
            "SELECT {COMMENTARY_COLUMNS} FROM commentary WHERE match_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2"
        ))
        .bind(match_id.get())
        .bind(to_sql_limit(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(persistence_error)?;

        rows.into_iter().map(commentary_from_row).collect()
    }
}

fn persistence_error(e: sqlx::Error) -> GatewayError {
    GatewayError::PersistenceError(e.to_string())
}

fn to_sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

fn row_match_id(raw: i64) -> Result<MatchId, GatewayError> {
    MatchId::new(raw)
        .ok_or_else(|| GatewayError::PersistenceError(format!("stored match id {raw} is not positive")))
}

fn match_from_row(row: MatchRow) -> Result<Match, GatewayError> {
    let (id, sport, home_team, away_team, status, start_time, end_time, home_score, away_score, created_at) =
        row;
    let status = MatchStatus::parse(&status)
        .ok_or_else(|| GatewayError::PersistenceError(format!("unknown match status {status:?}")))?;
    Ok(Match {
        id: row_match_id(id)?,
        sport,
        home_team,
        away_team,
        status,
        start_time,
        end_time,
        home_score,
        away_score,
        created_at,
    })
}

fn commentary_from_row(row: CommentaryRow) -> Result<Commentary, GatewayError> {
    let (id, match_id, minute, sequence, period, event_type, actor, team, message, metadata, tags, created_at) =
        row;
    Ok(Commentary {
        id,
        match_id: row_match_id(match_id)?,
        minute,
        sequence,
        period,
        event_type,
        actor,
        team,
        message,
        metadata,
        tags,
        created_at,
    })
}
