//! Infrastructure 層
//!
//! ドメイン層が定義する trait（`RoomRegistry`, `RoomSpawner`, `FrameReader`, `FrameWriter`）の
//! 具体的な実装と、ルームブローカー本体を提供します。

pub mod broker;
pub mod dto;
pub mod registry;
pub mod transport;
