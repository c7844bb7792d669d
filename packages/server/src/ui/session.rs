//! Participant session: one reader loop and one writer loop per connection.
//!
//! The reader decodes inbound frames and submits them to the room broker.
//! The writer drains the participant's outbound queue onto the connection.
//! The broker closes the queue on unregister or eviction, which is the
//! writer's signal to send a close frame and stop.

use rakugaki_shared::message::Message;

use crate::domain::{
    Envelope, FrameReader, FrameWriter, OutboundReceiver, Participant, ParticipantId,
};

/// Read frames until the peer goes away, then unregister from the room.
pub async fn read_loop<R: FrameReader>(mut reader: R, participant: Participant) {
    let Participant { id, room } = participant;

    loop {
        let bytes = match reader.read_frame().await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                tracing::debug!(participant = %id, "Peer closed connection");
                break;
            }
            Err(e) => {
                tracing::debug!(participant = %id, "Read error: {}", e);
                break;
            }
        };

        let message = match Message::decode(&bytes) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(participant = %id, "Skipping undecodable frame: {}", e);
                continue;
            }
        };

        if room.deliver(Envelope::new(id, message)).await.is_err() {
            tracing::debug!(participant = %id, "Room closed, stopping reader");
            break;
        }
    }

    // the broker ignores a participant it already evicted
    if room.unregister(id).await.is_err() {
        tracing::debug!(participant = %id, "Room already closed on unregister");
    }
}

/// Write queued frames until the queue closes or the connection fails.
pub async fn write_loop<W: FrameWriter>(
    mut writer: W,
    mut outbound: OutboundReceiver,
    participant: ParticipantId,
) {
    while let Some(frame) = outbound.recv().await {
        if let Err(e) = writer.write_text(frame).await {
            tracing::debug!(%participant, "Write error: {}", e);
            let _ = writer.close().await;
            return;
        }
    }

    tracing::debug!(%participant, "Outbound queue closed, closing connection");
    if let Err(e) = writer.write_close().await {
        tracing::debug!(%participant, "Failed to send close frame: {}", e);
    }
    let _ = writer.close().await;
}
