//! Match handlers: create and list.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{CreateMatchRequest, ListQuery, MatchListResponse, MatchResponse};
use crate::app_state::AppState;
use crate::domain::MatchId;
use crate::error::{ErrorResponse, GatewayError};

const DEFAULT_LIMIT: u32 = 10;

/// `POST /matches`: Create a match and announce it to every client.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] on a malformed or invalid body,
/// or a persistence error if the store rejects the write.
#[utoipa::path(
    post,
    path = "/api/v1/matches",
    tag = "Matches",
    summary = "Create a match",
    description = "Persists a new match and broadcasts `match_created` to every connected WebSocket client.",
    request_body = CreateMatchRequest,
    responses(
        (status = 201, description = "Match created", body = MatchResponse),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    )
)]
pub async fn create_match(
    State(state): State<AppState>,
    body: Result<Json<CreateMatchRequest>, JsonRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let Json(req) = body.map_err(|e| GatewayError::InvalidRequest(e.body_text()))?;
    let new = req.validate()?;
    let data = state.match_service.create_match(new).await?;
    Ok((StatusCode::CREATED, Json(MatchResponse { data })))
}

/// `GET /matches`: List matches, newest first.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] on an out-of-range `limit`.
#[utoipa::path(
    get,
    path = "/api/v1/matches",
    tag = "Matches",
    summary = "List matches",
    description = "Returns up to `limit` matches (default 10, max 100), newest first.",
    params(ListQuery),
    responses(
        (status = 200, description = "Match list", body = MatchListResponse),
        (status = 400, description = "Invalid query", body = ErrorResponse),
    )
)]
pub async fn list_matches(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let Query(query) = query.map_err(|e| GatewayError::InvalidRequest(e.body_text()))?;
    let limit = query.resolve(DEFAULT_LIMIT)?;
    let data = state.match_service.list_matches(limit).await?;
    Ok(Json(MatchListResponse { data }))
}

/// Parses a `{id}` path segment into a [`MatchId`].
///
/// # Errors
///
/// Returns [`GatewayError::InvalidMatchId`] unless the segment is a positive
/// integer.
pub fn parse_match_id(raw: &str) -> Result<MatchId, GatewayError> {
    raw.parse::<i64>()
        .ok()
        .and_then(MatchId::new)
        .ok_or_else(|| GatewayError::InvalidMatchId(raw.to_string()))
}

/// Extracts and validates the match id path segment.
pub(crate) fn match_id_from_path(Path(raw): Path<String>) -> Result<MatchId, GatewayError> {
    parse_match_id(&raw)
}

/// Match routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/matches", get(list_matches).post(create_match))
}
