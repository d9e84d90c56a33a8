//! Observer WebSocket.
//!
//! Each connection is one subscriber: engine events are forwarded as JSON
//! text frames, and text frames from the client are parsed as control
//! commands. Commands from one connection are applied in order by a
//! dedicated task, so a slow classification never stalls event delivery.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use moderator_application::{ModerationEngine, SubscriberId};
use moderator_core::command::ControlCommand;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::app::AppState;

/// Frames larger than this are rejected before parsing.
const MAX_FRAME_BYTES: usize = 64 * 1024;
/// Commands waiting to be applied per connection.
const COMMAND_QUEUE: usize = 32;
/// Reported as the command name when a frame does not parse.
const UNPARSED_COMMAND: &str = "unknown";

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let (id, mut events) = state.engine.connect().await.into_parts();
    let (frame_tx, frame_rx) = mpsc::channel(COMMAND_QUEUE);
    tokio::spawn(run_commands(state.engine.clone(), id, frame_rx));

    loop {
        tokio::select! {
            _ = state.shutdown.cancelled() => {
                if let Err(e) = socket.send(Message::Close(None)).await {
                    debug!("[Ws] Failed to send Close frame to {}: {}", id, e);
                }
                break;
            }
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if text.len() > MAX_FRAME_BYTES {
                        state.engine.report_error(
                            id,
                            UNPARSED_COMMAND,
                            format!("frame of {} bytes exceeds {} bytes", text.len(), MAX_FRAME_BYTES),
                        );
                    } else if frame_tx.try_send(text).is_err() {
                        state.engine.report_error(
                            id,
                            UNPARSED_COMMAND,
                            "too many pending commands".to_string(),
                        );
                    }
                }
                Some(Ok(Message::Ping(data))) => {
                    if socket.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!("[Ws] Receive error from {}: {}", id, e);
                    break;
                }
            },
            outgoing = events.recv() => {
                let Some(event) = outgoing else {
                    break;
                };
                match serde_json::to_string(&event) {
                    Ok(text) => {
                        if socket.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("[Ws] Failed to encode {} event: {}", event.name(), e),
                }
            }
        }
    }

    state.engine.disconnect(id);
}

async fn run_commands(
    engine: ModerationEngine,
    subscriber: SubscriberId,
    mut frames: mpsc::Receiver<String>,
) {
    while let Some(text) = frames.recv().await {
        handle_frame(&engine, subscriber, &text).await;
    }
}

/// Parses and applies one text frame. Errors go back to `subscriber` only.
pub(crate) async fn handle_frame(engine: &ModerationEngine, subscriber: SubscriberId, text: &str) {
    match ControlCommand::parse(text) {
        Ok(command) => {
            debug!("[Ws] {} from {}", command.name(), subscriber);
            // Failures were already reported to the subscriber.
            let _ = engine.handle(subscriber, command).await;
        }
        Err(e) => engine.report_error(subscriber, UNPARSED_COMMAND, e.to_string()),
    }
}
