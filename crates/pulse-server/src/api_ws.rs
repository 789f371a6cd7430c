//! In-process WebSocket gateway.
//!
//! `GET /ws` upgrades to a WebSocket, assigns the client a connection id,
//! and drives the same lifecycle entry points a managed gateway would:
//! `connect` on upgrade, `message` per inbound frame, `disconnect` on close.
//! Replies travel back through the [`ConnectionHub`], which is the
//! [`Transport`] for sockets held by this process.

use crate::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        Extension, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use pulse_relay::{connect, disconnect, message, DeliveryError, LifecycleResponse, Transport};
use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

/// Outbound frames buffered per connection before further replies fail.
const OUTBOUND_BUFFER: usize = 64;

/// Outbound senders for sockets held by this process, keyed by connection id.
///
/// Uses `std::sync::RwLock`: every acquisition is a brief map operation that
/// never spans an `.await`, and [`Transport::send`] is called from blocking
/// tasks.
#[derive(Clone, Default)]
pub struct ConnectionHub {
    senders: Arc<RwLock<HashMap<String, mpsc::Sender<String>>>>,
}

impl ConnectionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches an outbound channel to `connection_id`, replacing any
    /// previous one.
    pub fn attach(&self, connection_id: String, sender: mpsc::Sender<String>) {
        if let Ok(mut senders) = self.senders.write() {
            senders.insert(connection_id, sender);
        }
    }

    /// Detaches `connection_id`. Later sends to it report `Gone`.
    pub fn detach(&self, connection_id: &str) {
        if let Ok(mut senders) = self.senders.write() {
            senders.remove(connection_id);
        }
    }

    /// Number of attached sockets.
    pub fn len(&self) -> usize {
        self.senders.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Transport for ConnectionHub {
    fn send(&self, connection_id: &str, payload: &str) -> Result<(), DeliveryError> {
        let sender = self
            .senders
            .read()
            .map_err(|_| DeliveryError::Failed("connection hub lock poisoned".to_string()))?
            .get(connection_id)
            .cloned()
            .ok_or(DeliveryError::Gone)?;

        match sender.try_send(payload.to_string()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Closed(_)) => Err(DeliveryError::Gone),
            Err(TrySendError::Full(_)) => {
                Err(DeliveryError::Failed("outbound buffer full".to_string()))
            }
        }
    }
}

/// Handler for `GET /ws`.
pub async fn ws_handler(
    Extension(state): Extension<Arc<AppState>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Runs a lifecycle entry point on the blocking pool.
async fn run_lifecycle<F>(f: F) -> LifecycleResponse
where
    F: FnOnce() -> LifecycleResponse + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .unwrap_or_else(|e| LifecycleResponse::server_error(format!("task join error: {e}")))
}

/// Handles one WebSocket connection from upgrade to close.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection_id = Uuid::new_v4().to_string();
    let (mut sink, mut stream) = socket.split();

    let (tx, mut rx) = mpsc::channel::<String>(OUTBOUND_BUFFER);
    state.hub.attach(connection_id.clone(), tx);

    let registered = {
        let state = state.clone();
        let id = connection_id.clone();
        run_lifecycle(move || connect(&state.registry, &id)).await
    };
    if !registered.is_success() {
        tracing::error!(
            connection_id = %connection_id,
            body = %registered.body,
            "closing websocket: connect failed"
        );
        state.hub.detach(&connection_id);
        return;
    }

    let send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sink.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(frame)) = stream.next().await {
        let body = match frame {
            Message::Text(text) => Some(text.to_string()),
            Message::Binary(bytes) => String::from_utf8(bytes.to_vec()).ok(),
            Message::Close(_) => break,
            _ => continue,
        };

        let state = state.clone();
        let id = connection_id.clone();
        run_lifecycle(move || message(&state.registry, &state.hub, &id, body.as_deref())).await;
    }

    state.hub.detach(&connection_id);
    send_task.abort();

    let state_for_disconnect = state.clone();
    let id = connection_id.clone();
    let res = run_lifecycle(move || disconnect(&state_for_disconnect.registry, &id)).await;
    if !res.is_success() {
        tracing::warn!(
            connection_id = %connection_id,
            body = %res.body,
            "disconnect cleanup failed"
        );
    }
}
