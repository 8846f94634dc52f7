// Player avatars: replicated, owned by the participant that joined with them.

use crate::domain::entity::{EntityId, ParticipantId, forward_from_yaw};
use glam::Vec3;

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: EntityId,
    pub owner: ParticipantId,
    pub display_name: String,
    pub position: Vec3,
    pub yaw: f32,
    pub radius: f32,
}

/// Avatar id reserved for a participant (sequence 0 of its id block).
pub fn avatar_id(owner: ParticipantId) -> EntityId {
    EntityId::compose(owner, 0)
}

impl Player {
    pub fn forward(&self) -> Vec3 {
        forward_from_yaw(self.yaw)
    }
}
