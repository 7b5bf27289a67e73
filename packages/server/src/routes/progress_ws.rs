//! WebSocket progress endpoint.
//!
//! GET /ws/:session_id
//!
//! Upgrades to a WebSocket and forwards progress events for the given
//! session as JSON text frames. The connection is held open across
//! valuations: a client may open the socket once and submit several
//! requests under the same session id.
//!
//! Inbound frames are drained and discarded so the connection stays
//! live under client keep-alive traffic (pings are answered by the
//! protocol layer). A failed send or a close frame ends the task and
//! removes the session, unless a newer registration has replaced it.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use tracing::{debug, warn};

use crate::app::AppState;
use crate::progress::ProgressHub;

pub async fn progress_ws_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| serve_progress(socket, state.hub.clone(), session_id))
}

async fn serve_progress(mut socket: WebSocket, hub: ProgressHub, session_id: String) {
    let (tx, mut rx) = hub.register(&session_id).await;
    // Keep only a weak identity: the hub's entry must be the one
    // strong sender, so replacing it closes this channel and ends the
    // task instead of leaving a replaced socket idling.
    let identity = tx.downgrade();
    drop(tx);
    debug!(%session_id, "progress socket opened");

    loop {
        tokio::select! {
            event = rx.recv() => {
                // None means the hub dropped or replaced this
                // registration's sender; end the task.
                let Some(event) = event else { break };

                let payload = match serde_json::to_string(&event) {
                    Ok(payload) => payload,
                    Err(error) => {
                        warn!(%session_id, %error, "failed to serialize progress event");
                        continue;
                    }
                };
                if socket.send(Message::Text(payload)).await.is_err() {
                    debug!(%session_id, "progress socket send failed, closing");
                    break;
                }
            }
            inbound = socket.recv() => {
                match inbound {
                    // Clients may send keep-alive chatter; it carries
                    // no meaning here.
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    // A failed upgrade means the hub already dropped this sender, so
    // there is nothing left to unregister (and a replacement entry
    // must not be evicted).
    if let Some(tx) = identity.upgrade() {
        hub.unregister(&session_id, &tx).await;
    }
    debug!(%session_id, "progress socket closed");
}
