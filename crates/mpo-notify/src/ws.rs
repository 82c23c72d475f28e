//! Server-side WebSocket upgrade handler, generalized from the
//! teacher's client-side `WebSocketTransport` (tokio-tungstenite) to a
//! per-connection fan-out task built on `axum`'s WebSocket support.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use mpo_common::{NotificationEvent, NotificationKind};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::bus::NotifyBus;

/// How often a silent keep-alive frame is sent on an otherwise idle
/// connection, so intermediate proxies don't time it out.
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(30);

pub fn router(bus: Arc<NotifyBus>) -> Router {
    Router::new().route("/ws/:owner", get(upgrade)).with_state(bus)
}

#[instrument(level = "debug", skip(ws, bus))]
async fn upgrade(
    Path(owner): Path<Uuid>,
    State(bus): State<Arc<NotifyBus>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, bus, owner))
}

/// One task per connection: replays buffered events, then forwards the
/// live broadcast stream, interleaved with keep-alive frames. Frames
/// are plain JSON text, matching the envelope `mpo-tlm` constructs.
async fn handle_connection(mut socket: WebSocket, bus: Arc<NotifyBus>, owner: Uuid) {
    let (mut receiver, replay) = bus.subscribe(owner).await;
    info!("✅ websocket connected for owner {owner}, replaying {} events", replay.len());

    for event in replay {
        if send_event(&mut socket, &event).await.is_err() {
            return;
        }
    }

    let mut keep_alive = tokio::time::interval(KEEP_ALIVE_INTERVAL);
    keep_alive.tick().await; // first tick fires immediately, skip it

    loop {
        tokio::select! {
            event = receiver.recv() => {
                match event {
                    Ok(event) => {
                        if send_event(&mut socket, &event).await.is_err() {
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("⚠️ owner {owner} lagged, skipped {skipped} events");
                        continue;
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
            _ = keep_alive.tick() => {
                let silent = silent_frame();
                if send_event(&mut socket, &silent).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(_)) => break,
                }
            }
        }
    }

    debug!("websocket disconnected for owner {owner}");
}

async fn send_event(socket: &mut WebSocket, event: &NotificationEvent) -> Result<(), axum::Error> {
    let payload = serde_json::to_string(event).expect("NotificationEvent always serializes");
    socket.send(Message::Text(payload)).await
}

/// A keep-alive frame carrying no new information; clients must not
/// count it as unread, per spec §4.9's silent-event guarantee.
fn silent_frame() -> NotificationEvent {
    let mut event = NotificationEvent::new(NotificationKind::FileUpdated, serde_json::json!({ "silent": true }));
    event.id = 0;
    event
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_frame_is_marked_silent_in_its_payload() {
        let frame = silent_frame();
        assert_eq!(frame.data["silent"], true);
    }
}
