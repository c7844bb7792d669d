//! UseCase: ルーム一覧取得

use std::sync::Arc;

use crate::domain::{RoomRegistry, RoomSnapshot};

/// ルーム一覧取得のユースケース
pub struct GetRoomsUseCase {
    registry: Arc<dyn RoomRegistry>,
}

impl GetRoomsUseCase {
    pub fn new(registry: Arc<dyn RoomRegistry>) -> Self {
        Self { registry }
    }

    /// 生きているルームのスナップショットを ID の昇順で返す
    ///
    /// 問い合わせ中に終了したルームは結果に含めません。
    pub async fn execute(&self) -> Vec<RoomSnapshot> {
        let mut snapshots = Vec::new();
        for id in self.registry.room_ids() {
            let Some(room) = self.registry.load(id) else {
                continue;
            };
            match room.inspect().await {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(_) => tracing::debug!(room = %id, "Room closed while listing, skipping"),
            }
        }
        snapshots
    }
}
