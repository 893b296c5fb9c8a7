//! Axum WebSocket upgrade handler.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{ConnectInfo, State};
use axum::http::{Extensions, HeaderMap, header};
use axum::response::IntoResponse;

use super::admission::HandshakeContext;
use super::connection::run_connection;
use crate::app_state::AppState;

/// `GET /ws`: Upgrade HTTP connection to WebSocket.
///
/// The admission gate is consulted before the upgrade completes; a denied
/// client is still upgraded so that it receives a proper close code.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    headers: HeaderMap,
    extensions: Extensions,
) -> impl IntoResponse {
    let peer = extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let ctx = HandshakeContext {
        peer,
        origin: header_value(&headers, header::ORIGIN),
        user_agent: header_value(&headers, header::USER_AGENT),
    };

    let hub = Arc::clone(&state.hub);
    let admission = hub.admit(&ctx).await;
    let max_payload = hub.config().max_payload_bytes;

    ws.max_message_size(max_payload)
        .max_frame_size(max_payload)
        .on_upgrade(move |socket| run_connection(socket, hub, admission, peer))
}

fn header_value(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}
