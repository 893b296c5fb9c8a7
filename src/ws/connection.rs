//! WebSocket connection task.
//!
//! Drives a single WebSocket: closes denied connections with the mapped
//! code, otherwise registers the connection, then multiplexes inbound
//! client frames with the connection's outbound queue until either side
//! goes away, the connection is terminated, or the server shuts down.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::ws::{CloseFrame, Message, Utf8Bytes, WebSocket};
use futures_util::{SinkExt, StreamExt};

use super::admission::Admission;
use super::client::{ClientConnection, Outbound};
use super::hub::RealtimeHub;
use super::messages::{
    ClientMessage, INVALID_JSON_MESSAGE, Inbound, SUBSCRIPTION_LIMIT_MESSAGE, ServerMessage,
    parse_client_message,
};
use super::subscription::SubscribeOutcome;

/// Close code sent to every client when the server shuts down.
const GOING_AWAY: u16 = 1001;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Denied connections are closed with the reason's close code and never
///   registered.
/// - Inbound control messages mutate the subscription index.
/// - Frames queued by broadcasts and replies are written in queue order;
///   probes requested by the liveness monitor are written ahead of them.
/// - Pongs acknowledge liveness probes.
pub async fn run_connection(
    socket: WebSocket,
    hub: Arc<RealtimeHub>,
    admission: Admission,
    peer: Option<SocketAddr>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    if let Admission::Deny(reason) = admission {
        let frame = CloseFrame {
            code: reason.close_code(),
            reason: Utf8Bytes::from_static(reason.as_str()),
        };
        let _ = ws_tx.send(Message::Close(Some(frame))).await;
        return;
    }

    let (conn, mut outbound_rx) = hub.accept(peer);
    let cancel = conn.cancel_token().clone();

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                if hub.is_shutting_down() {
                    let frame = CloseFrame {
                        code: GOING_AWAY,
                        reason: Utf8Bytes::from_static("Server shutting down"),
                    };
                    let _ = ws_tx.send(Message::Close(Some(frame))).await;
                }
                break;
            }
            // Liveness probe, never queued behind broadcast frames
            () = conn.probe_requested() => {
                if let Err(e) = ws_tx.send(Message::Ping(Bytes::new())).await {
                    tracing::debug!(conn_id = %conn.id(), error = %e, "websocket ping failed");
                    break;
                }
            }
            // Outbound frame queued by a reply or broadcast
            frame = outbound_rx.recv() => {
                let Some(Outbound::Text(text)) = frame else {
                    break;
                };
                if let Err(e) = ws_tx.send(Message::Text(text)).await {
                    tracing::debug!(conn_id = %conn.id(), error = %e, "websocket write failed");
                    break;
                }
            }
            // Incoming message from client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        handle_text_message(&hub, &conn, text.as_str());
                    }
                    Some(Ok(Message::Pong(_))) => conn.mark_alive(),
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!(conn_id = %conn.id(), error = %e, "websocket transport error");
                        break;
                    }
                }
            }
        }
    }

    hub.terminate(conn.id());
}

/// Applies one inbound text frame and queues the reply, if any.
///
/// Returns the reply that was produced:
/// - unparseable JSON → `error`;
/// - `subscribe` → `subscribed` (or `error` when the cap is reached);
/// - `unsubscribe` → `unsubscribed`;
/// - any other valid JSON → nothing.
pub fn handle_text_message(
    hub: &RealtimeHub,
    conn: &ClientConnection,
    text: &str,
) -> Option<&'static str> {
    let reply = match parse_client_message(text) {
        Inbound::Malformed => ServerMessage::Error {
            message: INVALID_JSON_MESSAGE,
        },
        Inbound::Unrecognized => {
            tracing::trace!(conn_id = %conn.id(), "ignoring unrecognized message");
            return None;
        }
        Inbound::Command(ClientMessage::Subscribe { match_id }) => {
            match hub.subscribe(match_id, conn) {
                SubscribeOutcome::Subscribed | SubscribeOutcome::AlreadySubscribed => {
                    ServerMessage::Subscribed { match_id }
                }
                SubscribeOutcome::LimitReached => ServerMessage::Error {
                    message: SUBSCRIPTION_LIMIT_MESSAGE,
                },
                SubscribeOutcome::Closed => return None,
            }
        }
        Inbound::Command(ClientMessage::Unsubscribe { match_id }) => {
            hub.unsubscribe(match_id, conn);
            ServerMessage::Unsubscribed { match_id }
        }
    };
    let _ = conn.send_message(&reply);
    Some(reply.type_str())
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;
    use crate::config::WsConfig;
    use crate::domain::MatchId;
    use crate::ws::admission::AllowAll;

    fn setup(config: WsConfig) -> (RealtimeHub, Arc<ClientConnection>, mpsc::Receiver<Outbound>) {
        let hub = RealtimeHub::new(config, Arc::new(AllowAll));
        let (conn, mut rx) = hub.accept(None);
        // drain welcome
        let _ = rx.try_recv();
        (hub, conn, rx)
    }

    fn next_json(rx: &mut mpsc::Receiver<Outbound>) -> serde_json::Value {
        let Ok(Outbound::Text(frame)) = rx.try_recv() else {
            panic!("expected a text frame");
        };
        let Ok(value) = serde_json::from_str(frame.as_str()) else {
            panic!("frame is not json");
        };
        value
    }

    fn id(raw: i64) -> MatchId {
        let Some(id) = MatchId::new(raw) else {
            panic!("valid id");
        };
        id
    }

    #[test]
    fn subscribe_replies_and_indexes() {
        let (hub, conn, mut rx) = setup(WsConfig::default());
        let reply = handle_text_message(&hub, &conn, r#"{"type":"subscribe","matchId":42}"#);
        assert_eq!(reply, Some("subscribed"));
        let value = next_json(&mut rx);
        assert_eq!(value["type"], "subscribed");
        assert_eq!(value["matchId"], 42);
        assert!(hub.index().contains(id(42), conn.id()));
        assert!(conn.is_subscribed(id(42)));
    }

    #[test]
    fn unsubscribe_replies_even_when_not_subscribed() {
        let (hub, conn, mut rx) = setup(WsConfig::default());
        let reply = handle_text_message(&hub, &conn, r#"{"type":"unsubscribe","matchId":3}"#);
        assert_eq!(reply, Some("unsubscribed"));
        assert_eq!(next_json(&mut rx)["matchId"], 3);
        assert!(!hub.index().has_subscribers(id(3)));
    }

    #[test]
    fn malformed_json_gets_error_and_connection_stays() {
        let (hub, conn, mut rx) = setup(WsConfig::default());
        assert_eq!(handle_text_message(&hub, &conn, "{nope"), Some("error"));
        let value = next_json(&mut rx);
        assert_eq!(value["type"], "error");
        assert_eq!(value["message"], INVALID_JSON_MESSAGE);
        assert!(conn.is_open());
        assert!(hub.registry().get(conn.id()).is_some());
    }

    #[test]
    fn non_integer_match_id_is_silently_ignored() {
        let (hub, conn, mut rx) = setup(WsConfig::default());
        let reply = handle_text_message(&hub, &conn, r#"{"type":"subscribe","matchId":"abc"}"#);
        assert_eq!(reply, None);
        assert!(rx.try_recv().is_err());
        assert_eq!(hub.index().match_count(), 0);
    }

    #[test]
    fn subscription_cap_reports_error() {
        let (hub, conn, mut rx) = setup(WsConfig {
            max_subscriptions: 1,
            ..WsConfig::default()
        });
        handle_text_message(&hub, &conn, r#"{"type":"subscribe","matchId":1}"#);
        let _ = rx.try_recv();
        let reply = handle_text_message(&hub, &conn, r#"{"type":"subscribe","matchId":2}"#);
        assert_eq!(reply, Some("error"));
        assert_eq!(next_json(&mut rx)["message"], SUBSCRIPTION_LIMIT_MESSAGE);
    }

    #[test]
    fn subscribe_after_termination_is_dropped() {
        let (hub, conn, _rx) = setup(WsConfig::default());
        hub.terminate(conn.id());
        let reply = handle_text_message(&hub, &conn, r#"{"type":"subscribe","matchId":9}"#);
        assert_eq!(reply, None);
        assert!(!hub.index().has_subscribers(id(9)));
    }
}
