//! ドメイン層
//!
//! ルーム・参加者・フレームの型と、インフラ層が実装する trait（依存性の逆転）を定義します。

pub mod error;
pub mod participant;
pub mod registry;
pub mod room;
pub mod room_id;
pub mod transport;

pub use error::{BrokerError, RoomIdError, TransportError};
pub use participant::{Participant, ParticipantId};
pub use registry::{RoomRegistry, RoomSpawner};
pub use room::{
    Envelope, Frame, INBOX_CAPACITY, MemberSnapshot, OUTBOUND_CAPACITY, OutboundReceiver,
    OutboundSender, Registration, RoomEvent, RoomHandle, RoomInbox, RoomSnapshot,
};
pub use room_id::RoomId;
pub use transport::{FrameReader, FrameWriter};

#[cfg(test)]
pub use transport::{MockFrameReader, MockFrameWriter};
