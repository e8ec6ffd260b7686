//! WebSocket handler implementation

use std::sync::Arc;

use axum::{
    extract::{State, WebSocketUpgrade},
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::ws::message::{ClientCommand, ServerMessage};
use crate::AppState;

/// Handle WebSocket connection upgrade
pub async fn ws_handler(
    State(state): State<Arc<AppState>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: axum::extract::ws::WebSocket, state: Arc<AppState>) {
    // Per-client outbound channel; the manager's broadcast writes into
    // it, and a slow client loses its registration instead of stalling
    // the stream
    let (tx, mut rx) = mpsc::channel::<String>(100);
    let client_id = state.manager.subscribe(tx.clone());
    info!("New WebSocket connection: {}", client_id);

    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Forward outbound messages to the socket
    let send_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if let Err(e) = ws_sender.send(axum::extract::ws::Message::Text(message)).await {
                error!("Error sending message: {}", e);
                break;
            }
        }
        let _ = ws_sender.close().await;
    });

    // Handshake with the current stream state
    let status = state.manager.status();
    let connected = ServerMessage::Connected {
        mode: status.mode,
        symbol: status.symbol,
        feed_available: status.feed_available,
        feed_connected: status.feed_connected,
    };
    if send_envelope(&tx, &connected).await.is_err() {
        state.manager.unsubscribe(&client_id);
        send_task.abort();
        return;
    }

    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(axum::extract::ws::Message::Text(text)) => {
                debug!("Received text message: {}", text);

                // Malformed commands are ignored, not fatal
                let command: ClientCommand = match serde_json::from_str(&text) {
                    Ok(command) => command,
                    Err(e) => {
                        debug!("Ignoring malformed command from {}: {}", client_id, e);
                        continue;
                    }
                };

                match command {
                    ClientCommand::SwitchSymbol { symbol } => {
                        let symbol =
                            symbol.unwrap_or_else(|| state.config.default_symbol.clone());
                        let outcome = state.manager.switch_symbol(&symbol).await;
                        debug!(
                            "client {} switched to {} (success={})",
                            client_id, outcome.symbol, outcome.success
                        );
                    }
                    ClientCommand::Ping => {
                        if send_envelope(&tx, &ServerMessage::Pong).await.is_err() {
                            break;
                        }
                    }
                }
            }
            Ok(axum::extract::ws::Message::Close(_)) => {
                debug!("Received close message");
                break;
            }
            Err(e) => {
                error!("Error receiving message: {}", e);
                break;
            }
            _ => {}
        }
    }

    info!("WebSocket connection closed: {}", client_id);
    state.manager.unsubscribe(&client_id);
    send_task.abort();
}

async fn send_envelope(tx: &mpsc::Sender<String>, message: &ServerMessage) -> Result<(), ()> {
    let text = match serde_json::to_string(message) {
        Ok(text) => text,
        Err(e) => {
            error!("Error serializing envelope: {}", e);
            return Err(());
        }
    };
    tx.send(text).await.map_err(|e| {
        error!("Error sending envelope: {}", e);
    })
}
