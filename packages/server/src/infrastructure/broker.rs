//! ルームブローカー
//!
//! ## 責務
//!
//! - ルームのメンバー集合の唯一の所有者（メンバー集合を読み書きするのはこのタスクだけ）
//! - 登録・登録解除・メッセージ・状態参照を 1 つの受信箱から届いた順に処理
//! - `method` に応じたメッセージのルーティング（draw / clear / history-request / history-response）
//!
//! ## 送信ポリシー
//!
//! 参加者の送信キューへは `try_send` のみを使い、ブローカーは決して待ちません。
//! キューが満杯（または書き込みタスクが終了済み）の参加者はその場で退出させ、
//! 送信キューを閉じます。

use std::{collections::HashMap, sync::Arc};

use rakugaki_shared::message::Method;
use tokio::sync::mpsc::error::TrySendError;

use crate::domain::{
    Envelope, Frame, MemberSnapshot, OutboundSender, ParticipantId, Registration, RoomHandle,
    RoomEvent, RoomId, RoomInbox, RoomRegistry, RoomSnapshot, RoomSpawner,
};

/// One member as tracked by the broker.
struct Member {
    /// Dropping the last sender closes the participant's queue.
    outbound: OutboundSender,
    initialized: bool,
    /// Join order, used to iterate members deterministically.
    seq: u64,
}

/// Event loop owning one room's membership.
pub struct RoomBroker {
    id: RoomId,
    members: HashMap<ParticipantId, Member>,
    next_seq: u64,
    inbox: RoomInbox,
}

impl RoomBroker {
    pub fn new(id: RoomId, inbox: RoomInbox) -> Self {
        Self {
            id,
            members: HashMap::new(),
            next_seq: 0,
            inbox,
        }
    }

    /// Start a broker for room `id` on its own task.
    ///
    /// When the room empties the task removes its own registry entry and exits.
    pub fn spawn(id: RoomId, registry: Arc<dyn RoomRegistry>) -> RoomHandle {
        let (handle, inbox) = RoomHandle::channel(id);
        let instance = handle.instance();

        tokio::spawn(async move {
            RoomBroker::new(id, inbox).run().await;
            registry.remove(id, instance);
            tracing::info!(room = %id, "Room closed");
        });

        tracing::info!(room = %id, "Room created");
        handle
    }

    /// Run until the last member leaves.
    pub async fn run(mut self) {
        while let Some(event) = self.inbox.recv().await {
            match event {
                RoomEvent::Register(registration) => self.handle_register(registration),
                RoomEvent::Unregister(participant) => self.handle_unregister(participant),
                // evictions during routing may empty the room too
                RoomEvent::Message(envelope) => self.handle_message(envelope),
                RoomEvent::Inspect(reply) => {
                    let _ = reply.send(self.snapshot());
                }
            }
            if self.is_abandoned() {
                break;
            }
        }
    }

    /// Someone joined and everyone has since left.
    fn is_abandoned(&self) -> bool {
        self.next_seq > 0 && self.members.is_empty()
    }

    fn handle_register(&mut self, registration: Registration) {
        let Registration {
            participant,
            outbound,
            ack,
        } = registration;

        // the first member seeds the room's canvas
        let initialized = self.members.is_empty();
        let seq = self.next_seq;
        self.next_seq += 1;
        self.members.insert(
            participant,
            Member {
                outbound,
                initialized,
                seq,
            },
        );

        tracing::info!(
            room = %self.id,
            %participant,
            initialized,
            members = self.members.len(),
            "Participant registered"
        );
        let _ = ack.send(initialized);
    }

    fn handle_unregister(&mut self, participant: ParticipantId) {
        if self.members.remove(&participant).is_none() {
            tracing::debug!(room = %self.id, %participant, "Unregister of non-member ignored");
            return;
        }
        tracing::info!(
            room = %self.id,
            %participant,
            members = self.members.len(),
            "Participant unregistered"
        );
        self.reseed();
    }

    fn handle_message(&mut self, envelope: Envelope) {
        let Envelope { origin, message } = envelope;

        let frame: Frame = match message.encode() {
            Ok(encoded) => Arc::from(encoded),
            Err(e) => {
                tracing::warn!(room = %self.id, %origin, "Dropping message: {}", e);
                return;
            }
        };

        match &message.method {
            Method::Draw | Method::Clear => {
                let targets = self.members_where(|id, member| member.initialized && id != origin);
                tracing::debug!(
                    room = %self.id,
                    %origin,
                    method = %message.method,
                    recipients = targets.len(),
                    "Relaying"
                );
                for target in targets {
                    self.try_deliver(target, &frame);
                }
            }
            Method::HistoryRequest => {
                let candidates =
                    self.members_where(|id, member| member.initialized && id != origin);
                match candidates
                    .into_iter()
                    .find(|candidate| self.try_deliver(*candidate, &frame))
                {
                    Some(responder) => {
                        tracing::debug!(room = %self.id, %origin, %responder, "History requested");
                    }
                    None => {
                        tracing::debug!(room = %self.id, %origin, "No peer to answer history request");
                    }
                }
            }
            Method::HistoryResponse => {
                let targets = self.members_where(|_, member| !member.initialized);
                for target in targets {
                    if self.try_deliver(target, &frame)
                        && let Some(member) = self.members.get_mut(&target)
                    {
                        member.initialized = true;
                        tracing::debug!(room = %self.id, participant = %target, "Participant initialized");
                    }
                }
            }
            Method::Unknown(tag) => {
                tracing::warn!(room = %self.id, %origin, method = %tag, "Unknown method, dropping message");
            }
        }
    }

    /// Members matching `filter`, in join order.
    fn members_where<F>(&self, predicate: F) -> Vec<ParticipantId>
    where
        F: Fn(ParticipantId, &Member) -> bool,
    {
        let mut matched: Vec<(u64, ParticipantId)> = self
            .members
            .iter()
            .filter(|(id, member)| predicate(**id, *member))
            .map(|(id, member)| (member.seq, *id))
            .collect();
        matched.sort_unstable_by_key(|(seq, _)| *seq);
        matched.into_iter().map(|(_, id)| id).collect()
    }

    /// Enqueue `frame` without waiting. A full or closed queue evicts the member.
    fn try_deliver(&mut self, target: ParticipantId, frame: &Frame) -> bool {
        let Some(member) = self.members.get(&target) else {
            return false;
        };
        match member.outbound.try_send(frame.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!(room = %self.id, participant = %target, "Outbound queue full, evicting");
                self.evict(target);
                false
            }
            Err(TrySendError::Closed(_)) => {
                tracing::info!(room = %self.id, participant = %target, "Writer gone, evicting");
                self.evict(target);
                false
            }
        }
    }

    fn evict(&mut self, target: ParticipantId) {
        // removing the member drops its sender, which closes the queue
        if self.members.remove(&target).is_some() {
            self.reseed();
        }
    }

    /// Keep at least one initialized member in a non-empty room.
    ///
    /// When the last initialized member leaves, the longest-waiting member
    /// becomes the seed.
    fn reseed(&mut self) {
        if self.members.values().any(|member| member.initialized) {
            return;
        }
        if let Some((id, member)) = self.members.iter_mut().min_by_key(|(_, member)| member.seq) {
            member.initialized = true;
            tracing::info!(room = %self.id, participant = %id, "Participant promoted to seed");
        }
    }

    fn snapshot(&self) -> RoomSnapshot {
        let members = self
            .members_where(|_, _| true)
            .into_iter()
            .filter_map(|id| {
                self.members.get(&id).map(|member| MemberSnapshot {
                    id,
                    initialized: member.initialized,
                })
            })
            .collect();
        RoomSnapshot {
            id: self.id,
            members,
        }
    }
}

/// Spawns a [`RoomBroker`] per room, wired to the registry it removes itself from.
pub struct BrokerSpawner {
    registry: Arc<dyn RoomRegistry>,
}

impl BrokerSpawner {
    pub fn new(registry: Arc<dyn RoomRegistry>) -> Self {
        Self { registry }
    }
}

impl RoomSpawner for BrokerSpawner {
    fn spawn(&self, id: RoomId) -> RoomHandle {
        RoomBroker::spawn(id, self.registry.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rakugaki_shared::message::Message;
    use tokio::sync::mpsc;

    use super::*;
    use crate::{
        domain::{OUTBOUND_CAPACITY, OutboundReceiver},
        infrastructure::registry::InMemoryRoomRegistry,
    };

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - 登録時の initialized フラグの割り当て（最初の参加者のみ true）
    // - draw / clear / history-request / history-response のルーティング
    // - 送信キュー満杯時の退出（eviction）
    // - 最後の参加者が抜けたときのルーム破棄とレジストリからの削除
    //
    // 【どのようなシナリオをテストするか】
    // 1. 単独参加者の draw は誰にも届かない
    // 2. 2 人目の参加者の履歴ハンドシェイク
    // 3. draw の送信者除外
    // 4. 遅い参加者の退出
    // 5. 最後の参加者の退出によるルーム破棄
    // 6. 未知のメソッドは破棄される
    // 7. 退出直前に送ったメッセージは退出より先に処理される
    // ========================================

    const ROOM: RoomId = RoomId::new(7);

    struct TestPeer {
        id: ParticipantId,
        rx: OutboundReceiver,
    }

    impl TestPeer {
        fn assert_received(&mut self, expected: &str) {
            let frame = self.rx.try_recv().expect("expected a frame");
            assert_eq!(&*frame, expected);
        }

        fn assert_nothing_received(&mut self) {
            assert!(self.rx.try_recv().is_err(), "expected no frame");
        }
    }

    fn spawn_room() -> (Arc<InMemoryRoomRegistry>, RoomHandle) {
        let registry = Arc::new(InMemoryRoomRegistry::new());
        let room = RoomBroker::spawn(ROOM, registry.clone());
        registry.store(ROOM, room.clone());
        (registry, room)
    }

    async fn join(room: &RoomHandle) -> (TestPeer, bool) {
        join_with_capacity(room, OUTBOUND_CAPACITY).await
    }

    async fn join_with_capacity(room: &RoomHandle, capacity: usize) -> (TestPeer, bool) {
        let id = ParticipantId::new();
        let (tx, rx) = mpsc::channel(capacity);
        let initialized = room.register(id, tx).await.unwrap();
        (TestPeer { id, rx }, initialized)
    }

    async fn send(room: &RoomHandle, from: &TestPeer, frame: &str) {
        let message = Message::decode(frame.as_bytes()).unwrap();
        room.deliver(Envelope::new(from.id, message)).await.unwrap();
    }

    /// Wait until every earlier submission has been processed.
    async fn settle(room: &RoomHandle) -> RoomSnapshot {
        room.inspect().await.unwrap()
    }

    async fn wait_until_removed(registry: &InMemoryRoomRegistry, id: RoomId) {
        tokio::time::timeout(Duration::from_secs(1), async {
            while registry.load(id).is_some() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("room entry was not removed");
    }

    #[tokio::test]
    async fn test_solo_join_and_draw() {
        // テスト項目: 単独参加者は初期化済みになり、その draw は誰にも配送されない
        // given (前提条件):
        let (_registry, room) = spawn_room();
        let (mut alice, initialized) = join(&room).await;

        // when (操作):
        send(&room, &alice, r#"{"method":"draw","data":{"x":1}}"#).await;
        let snapshot = settle(&room).await;

        // then (期待する結果):
        assert!(initialized);
        assert_eq!(snapshot.members.len(), 1);
        alice.assert_nothing_received();
    }

    #[tokio::test]
    async fn test_two_party_history_handshake() {
        // テスト項目: 後から参加した人の history-request が初期化済みの参加者に届き、
        //             history-response を受け取ると初期化済みになる
        // given (前提条件):
        let (_registry, room) = spawn_room();
        let (mut alice, alice_initialized) = join(&room).await;
        let (mut bob, bob_initialized) = join(&room).await;
        assert!(alice_initialized);
        assert!(!bob_initialized);

        // when (操作): bob が履歴を要求
        send(&room, &bob, r#"{"method":"history-request","data":null}"#).await;
        settle(&room).await;

        // then (期待する結果):
        alice.assert_received(r#"{"method":"history-request","data":null}"#);
        bob.assert_nothing_received();

        // when (操作): alice が履歴を返す
        let response = r#"{"method":"history-response","data":{"snapshot":[1,2]}}"#;
        send(&room, &alice, response).await;
        let snapshot = settle(&room).await;

        // then (期待する結果):
        bob.assert_received(response);
        alice.assert_nothing_received();
        assert!(snapshot.member(bob.id).unwrap().initialized);
    }

    #[tokio::test]
    async fn test_draw_fan_out_excludes_origin() {
        // テスト項目: draw は送信者以外の初期化済み参加者にそのまま届く
        // given (前提条件):
        let (_registry, room) = spawn_room();
        let (mut alice, _) = join(&room).await;
        let (mut bob, _) = join(&room).await;
        send(&room, &alice, r#"{"method":"history-response","data":[]}"#).await;
        settle(&room).await;
        bob.assert_received(r#"{"method":"history-response","data":[]}"#);

        // when (操作):
        let frame = r#"{"method":"draw","data":{"x":2}}"#;
        send(&room, &alice, frame).await;
        settle(&room).await;

        // then (期待する結果):
        bob.assert_received(frame);
        alice.assert_nothing_received();
    }

    #[tokio::test]
    async fn test_draw_and_clear_skip_uninitialized_members() {
        // テスト項目: 未初期化の参加者には draw / clear が届かない
        //             （未初期化の送信者からの draw は初期化済みの参加者に届く）
        // given (前提条件):
        let (_registry, room) = spawn_room();
        let (mut alice, _) = join(&room).await;
        let (mut bob, _) = join(&room).await;

        // when (操作):
        send(&room, &alice, r#"{"method":"clear","data":null}"#).await;
        send(&room, &bob, r#"{"method":"draw","data":{"x":3}}"#).await;
        settle(&room).await;

        // then (期待する結果):
        bob.assert_nothing_received();
        alice.assert_received(r#"{"method":"draw","data":{"x":3}}"#);
        alice.assert_nothing_received();
    }

    #[tokio::test]
    async fn test_history_request_has_at_most_one_recipient() {
        // テスト項目: history-request は初期化済みの参加者 1 人だけに届く
        // given (前提条件):
        let (_registry, room) = spawn_room();
        let (mut alice, _) = join(&room).await;
        let (mut bob, _) = join(&room).await;
        send(&room, &alice, r#"{"method":"history-response","data":[]}"#).await;
        settle(&room).await;
        bob.assert_received(r#"{"method":"history-response","data":[]}"#);
        let (mut carol, _) = join(&room).await;

        // when (操作):
        send(&room, &carol, r#"{"method":"history-request"}"#).await;
        settle(&room).await;

        // then (期待する結果):
        let received = [&mut alice, &mut bob]
            .into_iter()
            .map(|peer| peer.rx.try_recv().is_ok())
            .filter(|got| *got)
            .count();
        assert_eq!(received, 1);
        carol.assert_nothing_received();
    }

    #[tokio::test]
    async fn test_history_request_from_only_initialized_member_is_dropped() {
        // テスト項目: 送信者以外に初期化済みの参加者がいなければ history-request は破棄される
        // given (前提条件):
        let (_registry, room) = spawn_room();
        let (mut alice, _) = join(&room).await;
        let (mut bob, _) = join(&room).await;

        // when (操作):
        send(&room, &alice, r#"{"method":"history-request","data":null}"#).await;
        settle(&room).await;

        // then (期待する結果):
        alice.assert_nothing_received();
        bob.assert_nothing_received();
    }

    #[tokio::test]
    async fn test_history_response_initializes_every_waiting_member() {
        // テスト項目: history-response は未初期化の参加者全員に届き、全員が初期化済みになる
        // given (前提条件):
        let (_registry, room) = spawn_room();
        let (mut alice, _) = join(&room).await;
        let (mut bob, _) = join(&room).await;
        let (mut carol, _) = join(&room).await;

        // when (操作): 未初期化の bob が送っても宛先の判定には使われない
        let response = r#"{"method":"history-response","data":["a"]}"#;
        send(&room, &bob, response).await;
        let snapshot = settle(&room).await;

        // then (期待する結果):
        alice.assert_nothing_received();
        bob.assert_received(response);
        carol.assert_received(response);
        assert!(snapshot.members.iter().all(|m| m.initialized));
    }

    #[tokio::test]
    async fn test_history_response_without_waiting_members_is_dropped() {
        // テスト項目: 未初期化の参加者がいなければ history-response は誰にも届かない
        // given (前提条件):
        let (_registry, room) = spawn_room();
        let (mut alice, _) = join(&room).await;

        // when (操作):
        send(&room, &alice, r#"{"method":"history-response","data":[]}"#).await;
        settle(&room).await;

        // then (期待する結果):
        alice.assert_nothing_received();
    }

    #[tokio::test]
    async fn test_slow_consumer_is_evicted() {
        // テスト項目: 送信キューが満杯の参加者は退出させられ、キューが閉じられる
        // given (前提条件):
        let (_registry, room) = spawn_room();
        let (alice, _) = join(&room).await;
        let (mut bob, _) = join(&room).await;
        send(&room, &alice, r#"{"method":"history-response","data":[]}"#).await;

        // bob's writer is paused: fill the rest of the queue
        for i in 1..OUTBOUND_CAPACITY {
            send(&room, &alice, &format!(r#"{{"method":"draw","data":{}}}"#, i)).await;
        }
        let snapshot = settle(&room).await;
        assert_eq!(snapshot.members.len(), 2);

        // when (操作):
        send(&room, &alice, r#"{"method":"draw","data":"overflow"}"#).await;
        let snapshot = settle(&room).await;

        // then (期待する結果):
        assert!(snapshot.member(bob.id).is_none());
        let mut drained = 0;
        while let Some(frame) = bob.rx.recv().await {
            assert!(!frame.contains("overflow"));
            drained += 1;
        }
        assert_eq!(drained, OUTBOUND_CAPACITY);

        // subsequent draws have no recipients
        send(&room, &alice, r#"{"method":"draw","data":{"x":9}}"#).await;
        let snapshot = settle(&room).await;
        assert_eq!(snapshot.members.len(), 1);
    }

    #[tokio::test]
    async fn test_member_with_exited_writer_is_evicted() {
        // テスト項目: 書き込みタスクが終了した参加者は次の配送時に退出させられる
        // given (前提条件):
        let (_registry, room) = spawn_room();
        let (alice, _) = join(&room).await;
        let (bob, _) = join(&room).await;
        let bob_id = bob.id;
        drop(bob);

        // when (操作):
        send(&room, &alice, r#"{"method":"history-response","data":[]}"#).await;
        let snapshot = settle(&room).await;

        // then (期待する結果):
        assert!(snapshot.member(bob_id).is_none());
        assert_eq!(snapshot.members.len(), 1);
    }

    #[tokio::test]
    async fn test_unregister_closes_queue_and_duplicate_is_noop() {
        // テスト項目: 登録解除でキューが閉じられ、2 回目の登録解除は何もしない
        // given (前提条件):
        let (_registry, room) = spawn_room();
        let (alice, _) = join(&room).await;
        let (mut bob, _) = join(&room).await;

        // when (操作):
        room.unregister(bob.id).await.unwrap();
        room.unregister(bob.id).await.unwrap();
        let snapshot = settle(&room).await;

        // then (期待する結果):
        assert_eq!(bob.rx.recv().await, None);
        assert_eq!(snapshot.members.len(), 1);
        assert!(snapshot.member(alice.id).unwrap().initialized);
    }

    #[tokio::test]
    async fn test_last_leaver_destroys_room() {
        // テスト項目: 最後の参加者が抜けるとレジストリから削除され、
        //             同じ ID への次の参加は新しいブローカーで初期化済みになる
        // given (前提条件):
        let (registry, room) = spawn_room();
        let (alice, _) = join(&room).await;

        // when (操作):
        room.unregister(alice.id).await.unwrap();
        wait_until_removed(&registry, ROOM).await;

        // then (期待する結果):
        assert!(room.inspect().await.is_err());

        let fresh = RoomBroker::spawn(ROOM, registry.clone());
        registry.store(ROOM, fresh.clone());
        let (_carol, initialized) = join(&fresh).await;
        assert!(initialized);
        assert_ne!(fresh.instance(), room.instance());
    }

    #[tokio::test]
    async fn test_seed_is_promoted_when_last_initialized_member_leaves() {
        // テスト項目: 初期化済みの参加者がいなくなった場合、最も早く参加した人が初期化済みになる
        // given (前提条件):
        let (_registry, room) = spawn_room();
        let (alice, _) = join(&room).await;
        let (bob, _) = join(&room).await;
        let (carol, _) = join(&room).await;

        // when (操作):
        room.unregister(alice.id).await.unwrap();
        let snapshot = settle(&room).await;

        // then (期待する結果):
        assert!(snapshot.member(bob.id).unwrap().initialized);
        assert!(!snapshot.member(carol.id).unwrap().initialized);
    }

    #[tokio::test]
    async fn test_unknown_method_is_dropped() {
        // テスト項目: 未知のメソッドは誰にも配送されない
        // given (前提条件):
        let (_registry, room) = spawn_room();
        let (alice, _) = join(&room).await;
        let (mut bob, _) = join(&room).await;
        send(&room, &alice, r#"{"method":"history-response","data":[]}"#).await;
        settle(&room).await;
        bob.assert_received(r#"{"method":"history-response","data":[]}"#);

        // when (操作):
        send(&room, &alice, r#"{"method":"erase","data":{}}"#).await;
        let snapshot = settle(&room).await;

        // then (期待する結果):
        bob.assert_nothing_received();
        assert_eq!(snapshot.members.len(), 2);
    }

    #[tokio::test]
    async fn test_room_closes_when_eviction_empties_it() {
        // テスト項目: 退出処理でメンバーがいなくなった場合もルームは破棄される
        // given (前提条件):
        let (registry, room) = spawn_room();
        let (alice, _) = join(&room).await;
        let (bob, _) = join_with_capacity(&room, 1).await;
        send(&room, &alice, r#"{"method":"history-response","data":[]}"#).await;
        room.unregister(alice.id).await.unwrap();
        let snapshot = settle(&room).await;
        assert_eq!(snapshot.members.len(), 1);

        // when (操作): 既に退出した alice の draw で bob のキューが溢れる
        send(&room, &alice, r#"{"method":"draw","data":1}"#).await;

        // then (期待する結果):
        wait_until_removed(&registry, ROOM).await;
        drop(bob);
    }

    #[tokio::test]
    async fn test_history_response_sent_before_leaving_reaches_late_joiner() {
        // テスト項目: 初期化済みの参加者が history-response を送ってすぐ退出しても、
        //             未初期化の参加者は履歴を受け取ってから初期化済みになる
        // given (前提条件):
        let (_registry, room) = spawn_room();
        let (alice, _) = join(&room).await;
        let (mut bob, _) = join(&room).await;

        // when (操作):
        let response = r#"{"method":"history-response","data":["s"]}"#;
        send(&room, &alice, response).await;
        room.unregister(alice.id).await.unwrap();
        let snapshot = settle(&room).await;

        // then (期待する結果):
        bob.assert_received(response);
        assert_eq!(
            snapshot.members,
            vec![MemberSnapshot {
                id: bob.id,
                initialized: true
            }]
        );
    }
}
