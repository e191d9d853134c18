//! WebSocket feed of round lifecycle events.
//!
//! Each connected client gets its own subscription to the broadcaster and
//! receives `round_opened`/`round_result` messages as JSON. Delivery is
//! at-most-once: a client that connects after an event fired pulls history
//! through the recent-rolls endpoint instead.

use super::handlers::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

static CLIENT_COUNTER: AtomicU64 = AtomicU64::new(1);

/// GET /ws
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

async fn handle_connection(socket: WebSocket, state: Arc<AppState>) {
    let client_id = CLIENT_COUNTER.fetch_add(1, Ordering::SeqCst);
    info!(client_id, "websocket client connected");

    let mut events = state.service.subscribe();
    let (mut sender, mut receiver) = socket.split();

    // Forward engine events to the client.
    let send_task = tokio::spawn(async move {
        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(client_id, skipped, "websocket client lagged behind event feed");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            let message = match serde_json::to_string(&event) {
                Ok(json) => Message::Text(json),
                Err(e) => {
                    warn!("failed to serialize game event: {}", e);
                    continue;
                }
            };

            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    // Drain incoming frames; the feed is write-only apart from close/ping.
    let receive_task = tokio::spawn(async move {
        while let Some(message) = receiver.next().await {
            match message {
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    debug!(client_id, "websocket receive error: {}", e);
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = send_task => {}
        _ = receive_task => {}
    }

    info!(client_id, "websocket client disconnected");
}
