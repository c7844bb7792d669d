//! UI 層: axum サーバー、ハンドラー、参加者セッション

mod handler;
mod server;
pub mod session;
mod signal;
pub mod state;

pub use server::Server;
