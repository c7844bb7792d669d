//! Domain-level errors.

use thiserror::Error;

/// The `r` query parameter could not be turned into a room id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomIdError {
    #[error("room id is missing")]
    Missing,

    #[error("room id '{0}' is not an integer")]
    NotAnInteger(String),
}

/// A submission to a room broker that is no longer running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BrokerError {
    #[error("room broker has terminated")]
    Closed,
}

/// Failure of the underlying connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("read failed: {0}")]
    Read(String),

    #[error("write failed: {0}")]
    Write(String),
}
