use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use pollcast_core::domain::PollId;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::infra::{
    app_state::AppState,
    websocket::{ClientMessage, Connection, ServerMessage},
};

const SESSION_NOT_FOUND: &str = "Session not found";

/// Handle WebSocket upgrade request
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(state.config.realtime.subscriber_buffer);

    let connection = Arc::new(Connection::new(tx));
    let conn_id = connection.id;
    state.websocket_manager.add_connection(Arc::clone(&connection));
    info!(%conn_id, "websocket connected");

    // Writer: drains the queue until every sender is gone or the socket fails.
    tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let frame = match message.to_websocket() {
                Ok(frame) => frame,
                Err(err) => {
                    error!(%conn_id, error = %err, "failed to encode websocket message");
                    continue;
                }
            };
            if ws_sender.send(frame).await.is_err() {
                break;
            }
        }
    });

    while let Some(frame) = ws_receiver.next().await {
        let parsed = match frame {
            Ok(Message::Text(text)) => ClientMessage::from_text(text.as_str()),
            Ok(Message::Binary(bytes)) => ClientMessage::from_bytes(bytes.as_ref()),
            Ok(Message::Close(_)) => break,
            Ok(_) => {
                connection.touch();
                continue;
            }
            Err(err) => {
                debug!(%conn_id, error = %err, "websocket receive failed");
                break;
            }
        };

        connection.touch();
        match parsed {
            Ok(message) => handle_client_message(message, &state, &connection).await,
            Err(err) => debug!(%conn_id, error = %err, "ignoring unparseable frame"),
        }
    }

    // Clean up on disconnect
    state.websocket_manager.remove_connection(conn_id);
    info!(%conn_id, "websocket disconnected");
}

async fn handle_client_message(message: ClientMessage, state: &AppState, connection: &Connection) {
    let reply = match message {
        ClientMessage::JoinSession { session_id } => join_session(session_id, state, connection).await,
        ClientMessage::Ping { timestamp } => Some(ServerMessage::Pong { timestamp }),
    };

    if let Some(reply) = reply
        && let Err(err) = connection.send_message(reply).await
    {
        debug!(conn_id = %connection.id, error = %err, "reply dropped");
    }
}

/// Admit the connection to the poll's room. Success is silent; failures
/// come back as a `session_error` frame.
async fn join_session(
    session_id: String,
    state: &AppState,
    connection: &Connection,
) -> Option<ServerMessage> {
    let Some(poll_id) = PollId::parse(&session_id) else {
        return Some(ServerMessage::SessionError {
            session_id,
            message: SESSION_NOT_FOUND.to_string(),
        });
    };

    match state.services.membership.admit(&poll_id, connection.id).await {
        Ok(_) => {
            info!(conn_id = %connection.id, poll_id = %poll_id, "joined session");
            None
        }
        Err(err) => Some(ServerMessage::SessionError {
            session_id,
            message: err.to_string(),
        }),
    }
}
