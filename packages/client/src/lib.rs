//! Headless command-line peer for the Rakugaki drawing relay.
//!
//! Keeps a local list of draw payloads, answers history requests from late
//! joiners and reconnects when the connection drops.

pub mod canvas;
pub mod command;
pub mod error;
mod runner;
mod session;
mod ui;

pub use runner::run_client;
