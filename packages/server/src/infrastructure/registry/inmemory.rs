//! InMemory Room Registry 実装
//!
//! ドメイン層が定義する RoomRegistry trait の具体的な実装。
//! `DashMap` をプロセス内のルーム表として使用します。
//!
//! 保持するのはブローカーへのハンドルだけで、ルームの状態そのものは
//! 各ブローカータスクが所有します。

use dashmap::DashMap;
use uuid::Uuid;

use crate::domain::{RoomHandle, RoomId, RoomRegistry};

/// インメモリ Room Registry 実装
pub struct InMemoryRoomRegistry {
    rooms: DashMap<RoomId, RoomHandle>,
}

impl InMemoryRoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }
}

impl Default for InMemoryRoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomRegistry for InMemoryRoomRegistry {
    fn load(&self, id: RoomId) -> Option<RoomHandle> {
        self.rooms.get(&id).map(|entry| entry.value().clone())
    }

    fn store(&self, id: RoomId, room: RoomHandle) {
        self.rooms.insert(id, room);
    }

    fn remove(&self, id: RoomId, instance: Uuid) -> bool {
        let removed = self
            .rooms
            .remove_if(&id, |_, room| room.instance() == instance)
            .is_some();
        if removed {
            tracing::debug!(room = %id, "Room removed from registry");
        }
        removed
    }

    fn load_or_create(&self, id: RoomId, create: &dyn Fn(RoomId) -> RoomHandle) -> RoomHandle {
        // the entry guard holds the shard lock, so concurrent callers see one broker
        self.rooms
            .entry(id)
            .or_insert_with(|| create(id))
            .value()
            .clone()
    }

    fn room_ids(&self) -> Vec<RoomId> {
        let mut ids: Vec<RoomId> = self.rooms.iter().map(|entry| *entry.key()).collect();
        ids.sort();
        ids
    }
}
