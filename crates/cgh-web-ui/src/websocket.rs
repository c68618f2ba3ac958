//! WebSocket handler for real-time dashboard updates.
//!
//! Clients receive the full view on connect and after every poll event.
//! They may send the text commands `refresh`, `start` and `stop`.

use crate::metrics::MonitorMetrics;
use crate::state::{SharedState, StateUpdate};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Extension,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Commands accepted from clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClientCommand {
    Refresh,
    Start,
    Stop,
}

impl ClientCommand {
    fn parse(text: &str) -> Option<Self> {
        match text.trim() {
            "refresh" => Some(Self::Refresh),
            "start" => Some(Self::Start),
            "stop" => Some(Self::Stop),
            _ => None,
        }
    }
}

/// WebSocket upgrade handler.
///
/// GET /ws
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Extension(state): Extension<Arc<SharedState>>,
    Extension(broadcast_tx): Extension<broadcast::Sender<StateUpdate>>,
    Extension(metrics): Extension<Arc<MonitorMetrics>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, broadcast_tx, metrics))
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<SharedState>,
    broadcast_tx: broadcast::Sender<StateUpdate>,
    metrics: Arc<MonitorMetrics>,
) {
    info!("WebSocket client connected");
    metrics.websocket_clients.inc();

    let (mut sender, mut receiver) = socket.split();
    let mut broadcast_rx = broadcast_tx.subscribe();

    let initial = StateUpdate::Full(Box::new(state.view()));
    if let Ok(json) = serde_json::to_string(&initial) {
        if sender.send(Message::Text(json)).await.is_err() {
            warn!("Failed to send initial state to WebSocket client");
            metrics.websocket_clients.dec();
            return;
        }
    }

    let mut send_task = tokio::spawn(async move {
        loop {
            match broadcast_rx.recv().await {
                Ok(update) => {
                    if let Ok(json) = serde_json::to_string(&update) {
                        if sender.send(Message::Text(json)).await.is_err() {
                            break;
                        }
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    // The next full update supersedes whatever was dropped
                    warn!(dropped = n, "WebSocket client lagged, dropped messages");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let recv_state = Arc::clone(&state);
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => match ClientCommand::parse(&text) {
                    Some(command) => run_command(&recv_state, command),
                    None => debug!(text = %text, "Ignoring unknown WebSocket command"),
                },
                Ok(Message::Close(_)) => {
                    debug!("WebSocket client sent close");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "WebSocket receive error");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {
            debug!("WebSocket send task ended");
            recv_task.abort();
        }
        _ = &mut recv_task => {
            debug!("WebSocket receive task ended");
            send_task.abort();
        }
    }

    metrics.websocket_clients.dec();
    info!("WebSocket client disconnected");
}

fn run_command(state: &Arc<SharedState>, command: ClientCommand) {
    debug!(?command, "WebSocket command");
    match command {
        ClientCommand::Refresh => {
            let state = Arc::clone(state);
            tokio::spawn(async move { state.session().fetch_now().await });
        }
        ClientCommand::Start => state.session().start(),
        ClientCommand::Stop => state.session().stop(),
    }
}
