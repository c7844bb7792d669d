//! Relay server library for Rakugaki, a collaborative drawing board.
//!
//! Peers join a numbered room over WebSocket and exchange drawing events.
//! The server keeps no canvas of its own: each room is owned by a broker task
//! that relays events between initialized peers and bootstraps late joiners by
//! asking an existing peer for its canvas.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
