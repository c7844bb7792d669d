//! UseCase: ルーム詳細取得

use std::sync::Arc;

use crate::domain::{RoomId, RoomRegistry, RoomSnapshot};

use super::error::GetRoomDetailError;

/// ルーム詳細取得のユースケース
pub struct GetRoomDetailUseCase {
    registry: Arc<dyn RoomRegistry>,
}

impl GetRoomDetailUseCase {
    pub fn new(registry: Arc<dyn RoomRegistry>) -> Self {
        Self { registry }
    }

    pub async fn execute(&self, room_id: RoomId) -> Result<RoomSnapshot, GetRoomDetailError> {
        let room = self
            .registry
            .load(room_id)
            .ok_or(GetRoomDetailError::RoomNotFound)?;
        room.inspect()
            .await
            .map_err(|_| GetRoomDetailError::RoomNotFound)
    }
}
