//! Data Transfer Objects (DTOs) for the HTTP API.
//!
//! The WebSocket wire format lives in `rakugaki_shared::message`.

pub mod conversion;
pub mod http;
