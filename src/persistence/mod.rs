//! Persistence layer: match and commentary records.
//!
//! [`MatchStore`] selects between the PostgreSQL store (`sqlx::PgPool`) and
//! a process-local in-memory store. Callers only see create/list
//! operations; both backends return newest-first listings.

pub mod memory;
pub mod postgres;

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;

use crate::domain::{Commentary, Match, MatchId, NewCommentary, NewMatch};
use crate::error::GatewayError;

/// Record store backend.
#[derive(Debug, Clone)]
pub enum MatchStore {
    /// Process-local storage.
    Memory(Arc<InMemoryStore>),
    /// PostgreSQL storage.
    Postgres(PostgresStore),
}

impl MatchStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::Memory(Arc::new(InMemoryStore::new()))
    }

    /// Connects to PostgreSQL and applies migrations.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] if the pool cannot be
    /// created or a migration fails.
    pub async fn connect_postgres(
        url: &str,
        max_connections: u32,
        connect_timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(connect_timeout)
            .connect(url)
            .await
            .map_err(|e| GatewayError::PersistenceError(e.to_string()))?;
        let store = PostgresStore::new(pool);
        store.migrate().await?;
        Ok(Self::Postgres(store))
    }

    /// Inserts a match.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn create_match(&self, new: NewMatch) -> Result<Match, GatewayError> {
        match self {
            Self::Memory(store) => store.create_match(new).await,
            Self::Postgres(store) => store.create_match(new).await,
        }
    }

    /// Lists up to `limit` matches, newest first.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn list_matches(&self, limit: usize) -> Result<Vec<Match>, GatewayError> {
        match self {
            Self::Memory(store) => Ok(store.list_matches(limit).await),
            Self::Postgres(store) => store.list_matches(limit).await,
        }
    }

    /// Inserts a commentary line.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MatchNotFound`] if the match does not exist,
    /// or propagates backend failures.
    pub async fn create_commentary(&self, new: NewCommentary) -> Result<Commentary, GatewayError> {
        match self {
            Self::Memory(store) => store.create_commentary(new).await,
            Self::Postgres(store) => store.create_commentary(new).await,
        }
    }

    /// Lists up to `limit` commentary lines of a match, newest first.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn list_commentary(
        &self,
        match_id: MatchId,
        limit: usize,
    ) -> Result<Vec<Commentary>, GatewayError> {
        match self {
            Self::Memory(store) => Ok(store.list_commentary(match_id, limit).await),
            Self::Postgres(store) => store.list_commentary(match_id, limit).await,
        }
    }
}
