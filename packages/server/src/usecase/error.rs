//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::RoomId;

/// ルーム参加時のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    /// 生きているブローカーに登録できなかった
    #[error("room {0} is unavailable")]
    RoomUnavailable(RoomId),
}

/// ルーム詳細取得時のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetRoomDetailError {
    #[error("room not found")]
    RoomNotFound,
}
