//! Code shared by the Rakugaki relay server and its CLI peer.

pub mod logger;
pub mod message;
