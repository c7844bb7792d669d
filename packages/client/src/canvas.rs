//! The peer's local canvas, kept as the ordered list of draw payloads.

use rakugaki_shared::message::{Message, Method};
use serde_json::value::RawValue;

/// Draw payloads applied so far, oldest first.
#[derive(Debug, Default)]
pub struct CanvasHistory {
    strokes: Vec<Box<RawValue>>,
}

impl CanvasHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    /// Raw JSON of each stored stroke.
    pub fn strokes(&self) -> impl Iterator<Item = &str> {
        self.strokes.iter().map(|stroke| stroke.get())
    }

    /// Apply a received (or locally sent) message.
    ///
    /// Returns the reply to send back, if the message asks for one.
    pub fn apply(&mut self, message: &Message) -> Option<Message> {
        match &message.method {
            Method::Draw => {
                if let Some(stroke) = &message.data {
                    self.strokes.push(stroke.clone());
                }
                None
            }
            Method::Clear => {
                self.strokes.clear();
                None
            }
            Method::HistoryRequest => {
                match Message::with_data(Method::HistoryResponse, &self.strokes) {
                    Ok(reply) => Some(reply),
                    Err(e) => {
                        tracing::warn!("Failed to build history response: {}", e);
                        None
                    }
                }
            }
            Method::HistoryResponse => {
                let Some(data) = message.data() else {
                    tracing::warn!("History response without data, ignoring");
                    return None;
                };
                match serde_json::from_str::<Vec<Box<RawValue>>>(data) {
                    Ok(strokes) => self.strokes = strokes,
                    Err(e) => tracing::warn!("Malformed history response, ignoring: {}", e),
                }
                None
            }
            Method::Unknown(tag) => {
                tracing::debug!("Ignoring message with unknown method '{}'", tag);
                None
            }
        }
    }
}
