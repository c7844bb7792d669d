//! axum WebSocket を使った FrameReader / FrameWriter 実装
//!
//! ## 責務
//!
//! - 分割した WebSocket の受信側からデータフレームだけを取り出す
//! - 送信側にテキストフレーム・クローズフレームを書き込む
//!
//! WebSocket の upgrade と分割は UI 層（`ui/handler/websocket.rs`）で行われます。

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};

use crate::domain::{Frame, FrameReader, FrameWriter, TransportError};

/// What a single inbound WebSocket message means to the session.
#[derive(Debug, PartialEq, Eq)]
enum Inbound {
    Data(Vec<u8>),
    Control,
    Closed,
}

fn classify(message: Message) -> Inbound {
    match message {
        Message::Text(text) => Inbound::Data(text.as_str().as_bytes().to_vec()),
        Message::Binary(bytes) => Inbound::Data(bytes.to_vec()),
        // axum replies to pings itself
        Message::Ping(_) | Message::Pong(_) => Inbound::Control,
        Message::Close(_) => Inbound::Closed,
    }
}

/// Receiving half of an upgraded connection.
pub struct WebSocketReader {
    stream: SplitStream<WebSocket>,
}

impl WebSocketReader {
    pub fn new(stream: SplitStream<WebSocket>) -> Self {
        Self { stream }
    }
}

#[async_trait]
impl FrameReader for WebSocketReader {
    async fn read_frame(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        while let Some(message) = self.stream.next().await {
            let message = message.map_err(|e| TransportError::Read(e.to_string()))?;
            match classify(message) {
                Inbound::Data(bytes) => return Ok(Some(bytes)),
                Inbound::Control => continue,
                Inbound::Closed => return Ok(None),
            }
        }
        Ok(None)
    }
}

/// Sending half of an upgraded connection.
pub struct WebSocketWriter {
    sink: SplitSink<WebSocket, Message>,
}

impl WebSocketWriter {
    pub fn new(sink: SplitSink<WebSocket, Message>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl FrameWriter for WebSocketWriter {
    async fn write_text(&mut self, frame: Frame) -> Result<(), TransportError> {
        self.sink
            .send(Message::Text(frame.as_ref().into()))
            .await
            .map_err(|e| TransportError::Write(e.to_string()))
    }

    async fn write_close(&mut self) -> Result<(), TransportError> {
        self.sink
            .send(Message::Close(None))
            .await
            .map_err(|e| TransportError::Write(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.sink
            .close()
            .await
            .map_err(|e| TransportError::Write(e.to_string()))
    }
}
