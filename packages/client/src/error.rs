//! Error types for the drawing client.

use rakugaki_shared::message::CodecError;
use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Gave up reconnecting
    #[error("Failed to reconnect after {0} attempts")]
    ReconnectExhausted(u32),

    /// Unrecognized input line
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error(transparent)]
    Codec(#[from] CodecError),
}
