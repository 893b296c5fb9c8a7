//! Commentary handlers: create and list per match.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use super::matches::match_id_from_path;
use crate::api::dto::{
    CommentaryListResponse, CommentaryResponse, CreateCommentaryRequest, ListQuery, MAX_LIMIT,
};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};

/// `POST /matches/{id}/commentary`: Add a commentary line.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidMatchId`] on a bad path id,
/// [`GatewayError::InvalidRequest`] on an invalid body, or
/// [`GatewayError::MatchNotFound`] if the match does not exist.
#[utoipa::path(
    post,
    path = "/api/v1/matches/{id}/commentary",
    tag = "Commentary",
    summary = "Add commentary",
    description = "Persists a commentary line and pushes `commentary_created` to the match's subscribers.",
    params(
        ("id" = i64, Path, description = "Match id"),
    ),
    request_body = CreateCommentaryRequest,
    responses(
        (status = 201, description = "Commentary created", body = CommentaryResponse),
        (status = 400, description = "Invalid id or payload", body = ErrorResponse),
        (status = 404, description = "Match not found", body = ErrorResponse),
    )
)]
pub async fn create_commentary(
    State(state): State<AppState>,
    path: Path<String>,
    body: Result<Json<CreateCommentaryRequest>, JsonRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let match_id = match_id_from_path(path)?;
    let Json(req) = body.map_err(|e| GatewayError::InvalidRequest(e.body_text()))?;
    let new = req.validate(match_id)?;
    let data = state.match_service.create_commentary(new).await?;
    Ok((StatusCode::CREATED, Json(CommentaryResponse { data })))
}

/// `GET /matches/{id}/commentary`: List a match's commentary, newest first.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidMatchId`] on a bad path id or
/// [`GatewayError::InvalidRequest`] on an out-of-range `limit`.
#[utoipa::path(
    get,
    path = "/api/v1/matches/{id}/commentary",
    tag = "Commentary",
    summary = "List commentary",
    description = "Returns up to `limit` commentary lines (default and max 100), newest first.",
    params(
        ("id" = i64, Path, description = "Match id"),
        ListQuery,
    ),
    responses(
        (status = 200, description = "Commentary list", body = CommentaryListResponse),
        (status = 400, description = "Invalid id or query", body = ErrorResponse),
    )
)]
pub async fn list_commentary(
    State(state): State<AppState>,
    path: Path<String>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let match_id = match_id_from_path(path)?;
    let Query(query) = query.map_err(|e| GatewayError::InvalidRequest(e.body_text()))?;
    let limit = query.resolve(MAX_LIMIT)?;
    let data = state
        .match_service
        .list_commentary(match_id, limit)
        .await?;
    Ok(Json(CommentaryListResponse {
        count: data.len(),
        data,
    }))
}

/// Commentary routes.
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/matches/{id}/commentary",
        get(list_commentary).post(create_commentary),
    )
}
