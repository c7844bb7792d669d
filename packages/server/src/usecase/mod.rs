//! UseCase 層
//!
//! UI 層から呼ばれるアプリケーションロジック。ドメイン層の trait にのみ依存します。

pub mod error;
pub mod get_room_detail;
pub mod get_rooms;
pub mod join_room;

pub use error::{GetRoomDetailError, JoinError};
pub use get_room_detail::GetRoomDetailUseCase;
pub use get_rooms::GetRoomsUseCase;
pub use join_room::{JoinRoomUseCase, JoinedRoom, MAX_JOIN_ATTEMPTS};
