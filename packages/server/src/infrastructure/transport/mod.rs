//! Transport adapters

pub mod websocket;

pub use websocket::{WebSocketReader, WebSocketWriter};
