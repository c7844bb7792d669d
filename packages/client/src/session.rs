//! WebSocket client session.

use futures_util::{Sink, SinkExt, StreamExt};
use rakugaki_shared::message::{Message, Method};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message as WsMessage};

use crate::{
    canvas::CanvasHistory,
    command::Command,
    error::ClientError,
    ui::{notice, redisplay_prompt},
};

/// How a session that did not fail came to an end.
#[derive(Debug, PartialEq, Eq)]
pub enum SessionEnd {
    /// The user asked to leave
    Quit,
    /// The input stream was closed
    InputClosed,
}

/// Run one connection to `room` until the user quits or the connection drops.
///
/// `canvas` outlives the session so a reconnect can seed the room again.
pub async fn run_client_session(
    url: &str,
    room: i64,
    canvas: &mut CanvasHistory,
    input: &mut mpsc::UnboundedReceiver<String>,
) -> Result<SessionEnd, ClientError> {
    let url = format!("{}?r={}", url, room);

    let (ws_stream, _response) = connect_async(&url)
        .await
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;

    tracing::info!("Connected to room {}", room);
    println!(
        "\nJoined room {}. Commands: draw <json> | clear | history | quit\n",
        room
    );

    let (mut write, mut read) = ws_stream.split();

    // ask an existing peer for the current canvas
    send(&mut write, &Message::history_request()).await?;
    redisplay_prompt(room);

    loop {
        tokio::select! {
            frame = read.next() => {
                let text = match frame {
                    Some(Ok(WsMessage::Text(text))) => text,
                    Some(Ok(WsMessage::Close(_))) | None => {
                        tracing::info!("Server closed the connection");
                        return Err(ClientError::ConnectionError("Connection closed".to_string()));
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        tracing::warn!("WebSocket read error: {}", e);
                        return Err(ClientError::ConnectionError(e.to_string()));
                    }
                };

                let message = match Message::decode(text.as_str().as_bytes()) {
                    Ok(message) => message,
                    Err(e) => {
                        tracing::warn!("Ignoring undecodable frame: {}", e);
                        continue;
                    }
                };

                tracing::debug!("Received {}", message.method);
                if let Some(reply) = canvas.apply(&message) {
                    send(&mut write, &reply).await?;
                }
            }
            line = input.recv() => {
                let Some(line) = line else {
                    let _ = write.close().await;
                    return Ok(SessionEnd::InputClosed);
                };

                match Command::parse(&line) {
                    Ok(Command::Draw(message)) => {
                        send(&mut write, &message).await?;
                        canvas.apply(&message);
                    }
                    Ok(Command::Clear) => {
                        let message = Message::new(Method::Clear, None);
                        send(&mut write, &message).await?;
                        canvas.apply(&message);
                    }
                    Ok(Command::History) => {
                        notice(room, &format!("{} stroke(s) on the canvas", canvas.len()));
                    }
                    Ok(Command::Quit) => {
                        let _ = write.close().await;
                        return Ok(SessionEnd::Quit);
                    }
                    Err(e) => notice(room, &e.to_string()),
                }
                redisplay_prompt(room);
            }
        }
    }
}

async fn send<S>(write: &mut S, message: &Message) -> Result<(), ClientError>
where
    S: Sink<WsMessage> + Unpin,
    S::Error: std::fmt::Display,
{
    let json = message.encode()?;
    write
        .send(WsMessage::Text(json.into()))
        .await
        .map_err(|e| ClientError::ConnectionError(e.to_string()))
}
