//! Transport seam between a participant session and its connection.
//!
//! The session reads whole frames and writes text or close frames; how the
//! connection is upgraded or framed is up to the implementation.

use async_trait::async_trait;

use super::{error::TransportError, room::Frame};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FrameReader: Send {
    /// Read the next data frame. `Ok(None)` means the peer closed the connection.
    async fn read_frame(&mut self) -> Result<Option<Vec<u8>>, TransportError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FrameWriter: Send {
    /// Write one text frame.
    async fn write_text(&mut self, frame: Frame) -> Result<(), TransportError>;

    /// Write a close frame.
    async fn write_close(&mut self) -> Result<(), TransportError>;

    /// Flush and close the outgoing half of the connection.
    async fn close(&mut self) -> Result<(), TransportError>;
}
