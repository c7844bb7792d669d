//! WebSocket connection handler.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::stream::StreamExt;
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::{
    domain::{OUTBOUND_CAPACITY, RoomId},
    infrastructure::transport::{WebSocketReader, WebSocketWriter},
    ui::{
        session::{read_loop, write_loop},
        state::AppState,
    },
};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    /// Room id. Parsed by hand so that a bad value still gets upgraded and closed.
    pub r: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> impl IntoResponse {
    match RoomId::try_from(query.r.as_deref()) {
        Ok(room_id) => ws.on_upgrade(move |socket| handle_socket(socket, state, room_id)),
        Err(e) => {
            tracing::warn!("Rejecting connection: {}", e);
            ws.on_upgrade(reject_socket)
        }
    }
}

/// Close the connection without joining any room.
async fn reject_socket(mut socket: WebSocket) {
    if let Err(e) = socket.send(Message::Close(None)).await {
        tracing::debug!("Failed to send close frame: {}", e);
    }
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, room_id: RoomId) {
    let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_CAPACITY);

    let joined = match state.join_room_usecase.execute(room_id, outbound_tx).await {
        Ok(joined) => joined,
        Err(e) => {
            tracing::warn!("Failed to join room: {}", e);
            reject_socket(socket).await;
            return;
        }
    };
    let participant = joined.participant;
    let participant_id = participant.id;

    let (sink, stream) = socket.split();

    let reader = tokio::spawn(read_loop(WebSocketReader::new(stream), participant));
    let writer = tokio::spawn(write_loop(
        WebSocketWriter::new(sink),
        outbound_rx,
        participant_id,
    ));

    let (read_result, write_result) = tokio::join!(reader, writer);
    if let Err(e) = read_result {
        tracing::error!(participant = %participant_id, "Reader task failed: {}", e);
    }
    if let Err(e) = write_result {
        tracing::error!(participant = %participant_id, "Writer task failed: {}", e);
    }

    tracing::info!(room = %room_id, participant = %participant_id, "Session ended");
}
