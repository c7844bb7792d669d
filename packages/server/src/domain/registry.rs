//! Room registry trait 定義
//!
//! ルーム ID からブローカーへのプロセス全体のマッピング。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use uuid::Uuid;

use super::{room::RoomHandle, room_id::RoomId};

/// Room Registry trait
///
/// エントリはルームへの最初の参加時に作成され、最後の参加者が抜けたときに削除されます。
pub trait RoomRegistry: Send + Sync {
    /// ルームを取得（存在しなければ `None`）
    fn load(&self, id: RoomId) -> Option<RoomHandle>;

    /// ルームを登録（既存のエントリは上書き）
    fn store(&self, id: RoomId, room: RoomHandle);

    /// エントリが `instance` のブローカーを指している場合のみ削除
    ///
    /// 終了中のブローカーが後継のエントリを消さないためのチェックです。
    /// 削除した場合は `true` を返します。
    fn remove(&self, id: RoomId, instance: Uuid) -> bool;

    /// ルームを取得し、無ければ `create` で作成して登録（アトミック）
    fn load_or_create(&self, id: RoomId, create: &dyn Fn(RoomId) -> RoomHandle) -> RoomHandle;

    /// 現在登録されているルーム ID の一覧（昇順）
    fn room_ids(&self) -> Vec<RoomId>;
}

/// Room Spawner trait
///
/// 新しいルームのブローカータスクを起動し、そのハンドルを返します。
pub trait RoomSpawner: Send + Sync {
    fn spawn(&self, id: RoomId) -> RoomHandle;
}
