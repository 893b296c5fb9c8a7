//! Match service: persists matches and commentary, then publishes them to
//! WebSocket clients.

use crate::domain::{Commentary, Match, MatchId, NewCommentary, NewMatch};
use crate::error::GatewayError;
use crate::persistence::MatchStore;
use crate::ws::Broadcaster;

/// Orchestration layer for match and commentary writes.
///
/// Every write follows the same pattern: persist → publish → return. The
/// publish step is fire-and-forget and can never fail the write.
#[derive(Debug, Clone)]
pub struct MatchService {
    store: MatchStore,
    broadcaster: Broadcaster,
}

impl MatchService {
    /// Creates a new `MatchService`.
    #[must_use]
    pub fn new(store: MatchStore, broadcaster: Broadcaster) -> Self {
        Self { store, broadcaster }
    }

    /// Creates a match and broadcasts `match_created` to every client.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if the store rejects the write.
    pub async fn create_match(&self, new: NewMatch) -> Result<Match, GatewayError> {
        let record = self.store.create_match(new).await?;
        tracing::info!(match_id = %record.id, sport = %record.sport, "match created");
        self.broadcaster.publish_match_created(&record);
        Ok(record)
    }

    /// Lists up to `limit` matches, newest first.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] on storage failure.
    pub async fn list_matches(&self, limit: usize) -> Result<Vec<Match>, GatewayError> {
        self.store.list_matches(limit).await
    }

    /// Creates a commentary line and broadcasts `commentary_created` to the
    /// match's subscribers.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MatchNotFound`] if the match does not exist,
    /// or another [`GatewayError`] on storage failure.
    pub async fn create_commentary(&self, new: NewCommentary) -> Result<Commentary, GatewayError> {
        let record = self.store.create_commentary(new).await?;
        tracing::debug!(match_id = %record.match_id, commentary_id = record.id, "commentary created");
        self.broadcaster
            .publish_commentary_created(record.match_id, &record);
        Ok(record)
    }

    /// Lists up to `limit` commentary lines of a match, newest first.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] on storage failure.
    pub async fn list_commentary(
        &self,
        match_id: MatchId,
        limit: usize,
    ) -> Result<Vec<Commentary>, GatewayError> {
        self.store.list_commentary(match_id, limit).await
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};

    use super::*;
    use crate::config::WsConfig;
    use crate::ws::client::Outbound;
    use crate::ws::{AllowAll, RealtimeHub};

    fn make_service() -> (MatchService, RealtimeHub) {
        let hub = RealtimeHub::new(WsConfig::default(), Arc::new(AllowAll));
        let service = MatchService::new(MatchStore::in_memory(), hub.broadcaster().clone());
        (service, hub)
    }

    fn new_match() -> NewMatch {
        let start = Utc::now() + Duration::hours(1);
        NewMatch {
            sport: "basketball".to_string(),
            home_team: "Hawks".to_string(),
            away_team: "Owls".to_string(),
            start_time: start,
            end_time: Some(start + Duration::hours(2)),
            home_score: 0,
            away_score: 0,
        }
    }

    fn frame_type(frame: Outbound) -> String {
        let Outbound::Text(text) = frame;
        let Ok(value) = serde_json::from_str::<serde_json::Value>(text.as_str()) else {
            panic!("frame is not json");
        };
        value["type"].as_str().unwrap_or_default().to_string()
    }

    #[tokio::test]
    async fn create_match_emits_event() {
        let (service, hub) = make_service();
        let (_conn, mut rx) = hub.accept(None);
        let _ = rx.try_recv(); // welcome

        let Ok(record) = service.create_match(new_match()).await else {
            panic!("create failed");
        };
        assert_eq!(record.status, crate::domain::MatchStatus::Scheduled);

        let Ok(frame) = rx.try_recv() else {
            panic!("expected match_created");
        };
        assert_eq!(frame_type(frame), "match_created");
    }

    #[tokio::test]
    async fn commentary_for_missing_match_fails_without_publishing() {
        let (service, hub) = make_service();
        let (conn, mut rx) = hub.accept(None);
        let _ = rx.try_recv();
        let Some(match_id) = MatchId::new(5) else {
            panic!("valid id");
        };
        hub.subscribe(match_id, &conn);

        let result = service
            .create_commentary(NewCommentary {
                match_id,
                minute: None,
                sequence: 0,
                period: None,
                event_type: "kickoff".to_string(),
                actor: None,
                team: None,
                message: "We are under way".to_string(),
                metadata: None,
                tags: None,
            })
            .await;
        assert!(matches!(result, Err(GatewayError::MatchNotFound(_))));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn commentary_reaches_subscriber() {
        let (service, hub) = make_service();
        let Ok(record) = service.create_match(new_match()).await else {
            panic!("create failed");
        };
        let (conn, mut rx) = hub.accept(None);
        let _ = rx.try_recv();
        hub.subscribe(record.id, &conn);

        let result = service
            .create_commentary(NewCommentary {
                match_id: record.id,
                minute: Some(1),
                sequence: 1,
                period: Some("Q1".to_string()),
                event_type: "tip_off".to_string(),
                actor: None,
                team: None,
                message: "Tip-off".to_string(),
                metadata: None,
                tags: None,
            })
            .await;
        assert!(result.is_ok());
        let Ok(frame) = rx.try_recv() else {
            panic!("expected commentary_created");
        };
        assert_eq!(frame_type(frame), "commentary_created");
    }
}
