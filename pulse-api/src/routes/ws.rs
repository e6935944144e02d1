//! WebSocket route handler
//!
//! Streams feed snapshots to a connected client. The client receives the
//! current snapshot on connect and every later one; it may send `ping` and
//! `toggle_boost` messages.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use pulse_core::{ClientMessage, ServerMessage, Snapshot};
use pulse_services::SubscriptionGuard;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::AppState;

/// Outbound messages buffered per client before snapshots are dropped
const OUTBOUND_BUFFER: usize = 64;

/// Create WebSocket routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/ws", get(ws_handler))
}

/// WebSocket upgrade handler
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    info!("WebSocket upgrade request received");
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Forwards snapshots to one client's outbound queue in sequence order
///
/// A tick on another thread can reach the listener before its initial
/// delivery; anything not newer than the last forwarded snapshot is dropped.
struct SnapshotForwarder {
    last_sequence: Mutex<Option<u64>>,
    tx: mpsc::Sender<ServerMessage>,
}

impl SnapshotForwarder {
    fn new(tx: mpsc::Sender<ServerMessage>) -> Self {
        Self {
            last_sequence: Mutex::new(None),
            tx,
        }
    }

    /// Queue a snapshot; returns false if it was stale or could not be queued
    fn forward(&self, snapshot: &Snapshot) -> bool {
        // Held across the send so concurrent ticks are queued in order
        let mut last = self.last_sequence.lock();
        if last.is_some_and(|seq| snapshot.sequence <= seq) {
            debug!("Skipping stale snapshot #{}", snapshot.sequence);
            return false;
        }

        let message = ServerMessage::Snapshot {
            snapshot: snapshot.clone(),
        };
        match self.tx.try_send(message) {
            Ok(()) => {
                *last = Some(snapshot.sequence);
                true
            }
            Err(e) => {
                debug!("Dropping snapshot #{} for client: {}", snapshot.sequence, e);
                false
            }
        }
    }
}

/// Handle an established WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(OUTBOUND_BUFFER);

    // Listener runs on the broadcaster's thread and must not block
    let forwarder = SnapshotForwarder::new(tx.clone());
    let subscription = SubscriptionGuard::new(
        state
            .broadcaster
            .subscribe(move |snapshot| {
                forwarder.forward(snapshot);
            }),
    );
    info!("WebSocket client attached as {}", subscription.id());

    // Task: Forward queued messages to the socket
    let send_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let text = match serde_json::to_string(&message) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Failed to serialize server message: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(text) => {
                if let Some(reply) = handle_client_message(text.as_str(), &state) {
                    if tx.try_send(reply).is_err() {
                        debug!("Dropping reply for slow client");
                    }
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    send_task.abort();
    info!("WebSocket client {} disconnected", subscription.id());
}

/// Apply one client message, returning a direct reply if there is one
fn handle_client_message(text: &str, state: &AppState) -> Option<ServerMessage> {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::Ping { timestamp }) => Some(ServerMessage::Pong {
            client_timestamp: timestamp,
            server_timestamp: Utc::now().timestamp_millis(),
        }),
        // The new state reaches the client through its subscription
        Ok(ClientMessage::ToggleBoost) => {
            state.broadcaster.toggle_boost();
            None
        }
        Err(e) => {
            debug!("Invalid client message: {}", e);
            Some(ServerMessage::Error {
                message: format!("Invalid message: {}", e),
            })
        }
    }
}
