//! UseCase: ルーム参加処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinRoomUseCase::execute() メソッド
//! - ルームの取得または作成と、ブローカーへの登録
//!
//! ### どのような状況を想定しているか
//! - 正常系：新しいルームへの最初の参加（初期化済み）
//! - 正常系：既存ルームへの参加（未初期化）
//! - エッジケース：終了直前のブローカーに当たった場合の再試行
//! - 異常系：再試行しても生きたブローカーが得られない

use std::sync::Arc;

use crate::domain::{
    BrokerError, OutboundSender, Participant, ParticipantId, RoomHandle, RoomId, RoomRegistry,
    RoomSpawner,
};

use super::error::JoinError;

/// 終了中のブローカーに当たった場合の最大試行回数
pub const MAX_JOIN_ATTEMPTS: usize = 3;

/// 参加に成功したセッションの情報
#[derive(Debug, Clone)]
pub struct JoinedRoom {
    pub participant: Participant,
    /// このセッションが最初からキャンバスを持つ側として登録されたか
    pub initialized: bool,
}

/// ルーム参加のユースケース
pub struct JoinRoomUseCase {
    registry: Arc<dyn RoomRegistry>,
    spawner: Arc<dyn RoomSpawner>,
}

impl JoinRoomUseCase {
    pub fn new(registry: Arc<dyn RoomRegistry>, spawner: Arc<dyn RoomSpawner>) -> Self {
        Self { registry, spawner }
    }

    /// ルームに参加する
    ///
    /// ルームが存在しなければブローカーを起動して登録します。
    /// `outbound` はブローカーがこのセッション宛てのフレームを積むキューです。
    ///
    /// # Returns
    ///
    /// * `Ok(JoinedRoom)` - 登録成功
    /// * `Err(JoinError::RoomUnavailable)` - 終了中のブローカーにしか当たらなかった
    pub async fn execute(
        &self,
        room_id: RoomId,
        outbound: OutboundSender,
    ) -> Result<JoinedRoom, JoinError> {
        let participant = ParticipantId::new();
        let create = |id: RoomId| self.spawner.spawn(id);

        for attempt in 1..=MAX_JOIN_ATTEMPTS {
            let room: RoomHandle = self.registry.load_or_create(room_id, &create);

            match room.register(participant, outbound.clone()).await {
                Ok(initialized) => {
                    tracing::info!(
                        room = %room_id,
                        %participant,
                        initialized,
                        "Participant joined"
                    );
                    return Ok(JoinedRoom {
                        participant: Participant::new(participant, room),
                        initialized,
                    });
                }
                Err(BrokerError::Closed) => {
                    // the broker emptied between lookup and registration
                    tracing::debug!(room = %room_id, attempt, "Room closed while joining, retrying");
                    self.registry.remove(room_id, room.instance());
                }
            }
        }

        tracing::warn!(room = %room_id, "Giving up joining room");
        Err(JoinError::RoomUnavailable(room_id))
    }
}
