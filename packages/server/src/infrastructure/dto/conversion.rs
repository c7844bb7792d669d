//! Conversion logic between domain snapshots and DTOs.

use crate::{
    domain::{MemberSnapshot, RoomSnapshot},
    infrastructure::dto::http as dto,
};

// ========================================
// Domain → DTO
// ========================================

impl From<&RoomSnapshot> for dto::RoomSummaryDto {
    fn from(snapshot: &RoomSnapshot) -> Self {
        Self {
            id: snapshot.id.value(),
            members: snapshot.members.len(),
        }
    }
}

impl From<MemberSnapshot> for dto::MemberDto {
    fn from(member: MemberSnapshot) -> Self {
        Self {
            id: member.id.to_string(),
            initialized: member.initialized,
        }
    }
}

impl From<RoomSnapshot> for dto::RoomDetailDto {
    fn from(snapshot: RoomSnapshot) -> Self {
        Self {
            id: snapshot.id.value(),
            members: snapshot.members.into_iter().map(Into::into).collect(),
        }
    }
}
