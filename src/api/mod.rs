//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Resource endpoints are mounted under `/api/v1`; `/health` and `/ws` live
//! at the root.

pub mod dto;
pub mod handlers;

use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::app_state::AppState;
use crate::ws::handler::ws_handler;

/// OpenAPI document for every REST endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "matchcast-gateway", description = "Live match events and commentary"),
    paths(
        handlers::system::health_handler,
        handlers::system::realtime_stats_handler,
        handlers::matches::create_match,
        handlers::matches::list_matches,
        handlers::commentary::create_commentary,
        handlers::commentary::list_commentary,
    ),
    components(schemas(
        crate::domain::Match,
        crate::domain::MatchStatus,
        crate::domain::Commentary,
        crate::error::ErrorResponse,
        crate::error::ErrorBody,
        dto::CreateMatchRequest,
        dto::MatchResponse,
        dto::MatchListResponse,
        dto::CreateCommentaryRequest,
        dto::CommentaryResponse,
        dto::CommentaryListResponse,
        handlers::system::HealthResponse,
        handlers::system::RealtimeStats,
    )),
    tags(
        (name = "Matches", description = "Match records"),
        (name = "Commentary", description = "Per-match commentary feed"),
        (name = "System", description = "Health and realtime statistics"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes())
}

/// Upper bound on producing a response. A WebSocket upgrade answers
/// immediately, so live sockets are not affected.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds the full application: REST routes, the `/ws` endpoint, HTTP
/// tracing, CORS, a request timeout, and (with the `swagger-ui` feature)
/// `/swagger-ui`.
pub fn build_app(state: AppState) -> Router {
    let router = Router::new()
        .merge(build_router())
        .route("/ws", get(ws_handler));

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    REQUEST_TIMEOUT,
                )),
        )
        .with_state(state)
}
