//! Participant identity and the session-side handle.

use std::fmt;

use uuid::Uuid;

use super::room::RoomHandle;

/// Identity of one connected session.
///
/// A fresh v4 UUID per session, so two sessions never compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParticipantId(Uuid);

impl ParticipantId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ParticipantId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A participant as seen by its own session tasks.
///
/// `room` is a lookup handle only; holding it does not keep the room alive.
#[derive(Debug, Clone)]
pub struct Participant {
    pub id: ParticipantId,
    pub room: RoomHandle,
}

impl Participant {
    pub fn new(id: ParticipantId, room: RoomHandle) -> Self {
        Self { id, room }
    }
}
