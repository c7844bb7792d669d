//! Room handle and the messages that flow into a room broker.
//!
//! A room is addressed only through its inbox. The broker task owning the
//! membership set is its single consumer, so every decision that reads or
//! mutates membership happens on that one task. Events from one submitter are
//! handled in the order they were submitted.

use std::sync::Arc;

use rakugaki_shared::message::Message;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use super::{error::BrokerError, participant::ParticipantId, room_id::RoomId};

/// Capacity of each participant's outbound frame queue.
pub const OUTBOUND_CAPACITY: usize = 256;

/// Capacity of a broker's inbox. Submitters wait when it is full.
pub const INBOX_CAPACITY: usize = 64;

/// One encoded text frame, shared between every recipient of a delivery.
pub type Frame = Arc<str>;

pub type OutboundSender = mpsc::Sender<Frame>;
pub type OutboundReceiver = mpsc::Receiver<Frame>;

/// An inbound message stamped with the participant that sent it.
///
/// `origin` never goes back on the wire.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub origin: ParticipantId,
    pub message: Message,
}

impl Envelope {
    pub fn new(origin: ParticipantId, message: Message) -> Self {
        Self { origin, message }
    }
}

/// A request to add a participant to the room.
///
/// The broker answers on `ack` with the `initialized` flag it assigned.
#[derive(Debug)]
pub struct Registration {
    pub participant: ParticipantId,
    pub outbound: OutboundSender,
    pub ack: oneshot::Sender<bool>,
}

/// Read-only view of one member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberSnapshot {
    pub id: ParticipantId,
    pub initialized: bool,
}

/// Read-only view of a room, members in join order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub id: RoomId,
    pub members: Vec<MemberSnapshot>,
}

impl RoomSnapshot {
    pub fn member(&self, id: ParticipantId) -> Option<&MemberSnapshot> {
        self.members.iter().find(|m| m.id == id)
    }
}

/// Everything a room broker can be asked to do.
#[derive(Debug)]
pub enum RoomEvent {
    Register(Registration),
    Unregister(ParticipantId),
    Message(Envelope),
    Inspect(oneshot::Sender<RoomSnapshot>),
}

/// Receiving end of a room's inbox, owned by the broker task.
pub type RoomInbox = mpsc::Receiver<RoomEvent>;

/// Cheap, cloneable address of a running room broker.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    id: RoomId,
    instance: Uuid,
    events: mpsc::Sender<RoomEvent>,
}

impl RoomHandle {
    /// Create a fresh inbox for room `id`.
    pub fn channel(id: RoomId) -> (Self, RoomInbox) {
        let (events, inbox) = mpsc::channel(INBOX_CAPACITY);
        let handle = Self {
            id,
            instance: Uuid::new_v4(),
            events,
        };
        (handle, inbox)
    }

    pub fn id(&self) -> RoomId {
        self.id
    }

    /// Identifies the broker behind this handle; differs between two brokers
    /// that served the same room id.
    pub fn instance(&self) -> Uuid {
        self.instance
    }

    async fn submit(&self, event: RoomEvent) -> Result<(), BrokerError> {
        self.events
            .send(event)
            .await
            .map_err(|_| BrokerError::Closed)
    }

    /// Add a participant. Returns the `initialized` flag it was given.
    pub async fn register(
        &self,
        participant: ParticipantId,
        outbound: OutboundSender,
    ) -> Result<bool, BrokerError> {
        let (ack, ack_rx) = oneshot::channel();
        self.submit(RoomEvent::Register(Registration {
            participant,
            outbound,
            ack,
        }))
        .await?;
        // dropped ack: the broker terminated with the registration still queued
        ack_rx.await.map_err(|_| BrokerError::Closed)
    }

    pub async fn unregister(&self, participant: ParticipantId) -> Result<(), BrokerError> {
        self.submit(RoomEvent::Unregister(participant)).await
    }

    pub async fn deliver(&self, envelope: Envelope) -> Result<(), BrokerError> {
        self.submit(RoomEvent::Message(envelope)).await
    }

    pub async fn inspect(&self) -> Result<RoomSnapshot, BrokerError> {
        let (reply, reply_rx) = oneshot::channel();
        self.submit(RoomEvent::Inspect(reply)).await?;
        reply_rx.await.map_err(|_| BrokerError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_submissions_fail_once_inbox_is_dropped() {
        // テスト項目: ブローカーが終了した後の送信は Closed エラーになる
        // given (前提条件):
        let (handle, inbox) = RoomHandle::channel(RoomId::new(1));
        drop(inbox);
        let (tx, _rx) = mpsc::channel(OUTBOUND_CAPACITY);

        // when (操作):
        let register = handle.register(ParticipantId::new(), tx).await;
        let unregister = handle.unregister(ParticipantId::new()).await;
        let inspect = handle.inspect().await;

        // then (期待する結果):
        assert_eq!(register, Err(BrokerError::Closed));
        assert_eq!(unregister, Err(BrokerError::Closed));
        assert_eq!(inspect, Err(BrokerError::Closed));
    }

    #[tokio::test]
    async fn test_register_fails_when_ack_is_dropped() {
        // テスト項目: 登録要求が処理されずに破棄された場合は Closed エラーになる
        // given (前提条件):
        let (handle, mut inbox) = RoomHandle::channel(RoomId::new(1));
        let (tx, _rx) = mpsc::channel(OUTBOUND_CAPACITY);

        // when (操作):
        let registering =
            tokio::spawn(async move { handle.register(ParticipantId::new(), tx).await });
        let pending = inbox.recv().await;
        assert!(matches!(pending, Some(RoomEvent::Register(_))));
        drop(pending);

        // then (期待する結果):
        assert_eq!(registering.await.unwrap(), Err(BrokerError::Closed));
    }

    #[test]
    fn test_handles_of_distinct_rooms_have_distinct_instances() {
        // テスト項目: 同じ RoomId でも別のブローカーは異なるインスタンス ID を持つ
        // when (操作):
        let (first, _first_inbox) = RoomHandle::channel(RoomId::new(7));
        let (second, _second_inbox) = RoomHandle::channel(RoomId::new(7));

        // then (期待する結果):
        assert_eq!(first.id(), second.id());
        assert_ne!(first.instance(), second.instance());
        assert_eq!(first.clone().instance(), first.instance());
    }

    #[tokio::test]
    async fn test_events_keep_submission_order() {
        // テスト項目: 同じ送信者のメッセージと登録解除は送った順にブローカーへ届く
        // given (前提条件):
        let (handle, mut inbox) = RoomHandle::channel(RoomId::new(1));
        let participant = ParticipantId::new();
        let message = Message::decode(br#"{"method":"history-response","data":[]}"#).unwrap();

        // when (操作):
        handle
            .deliver(Envelope::new(participant, message))
            .await
            .unwrap();
        handle.unregister(participant).await.unwrap();

        // then (期待する結果):
        assert!(matches!(inbox.recv().await, Some(RoomEvent::Message(_))));
        assert!(matches!(
            inbox.recv().await,
            Some(RoomEvent::Unregister(id)) if id == participant
        ));
    }
}
