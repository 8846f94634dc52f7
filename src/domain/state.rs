// Snapshot types published once per tick to the host.

use crate::domain::agent::{AgentState, HostileAgent};
use crate::domain::entity::{EntityId, ParticipantId};
use crate::domain::player::Player;
use crate::domain::projectile::Projectile;
use glam::Vec3;

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSnapshot {
    pub id: EntityId,
    pub owner: ParticipantId,
    pub display_name: String,
    pub position: Vec3,
    pub yaw: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentSnapshot {
    pub id: EntityId,
    /// Current authority holder as seen by this participant.
    pub authority: ParticipantId,
    pub position: Vec3,
    pub yaw: f32,
    pub health: f32,
    pub max_health: f32,
    pub state: AgentState,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectileSnapshot {
    pub id: EntityId,
    pub prefab: String,
    pub owner: Option<ParticipantId>,
    pub origin: Option<EntityId>,
    pub position: Vec3,
    pub heading: Vec3,
}

impl From<&Player> for PlayerSnapshot {
    fn from(p: &Player) -> Self {
        Self {
            id: p.id,
            owner: p.owner,
            display_name: p.display_name.clone(),
            position: p.position,
            yaw: p.yaw,
        }
    }
}

impl AgentSnapshot {
    pub fn new(agent: &HostileAgent, authority: ParticipantId) -> Self {
        Self {
            id: agent.id,
            authority,
            position: agent.position,
            yaw: agent.yaw,
            health: agent.health(),
            max_health: agent.max_health(),
            state: agent.state(),
        }
    }
}

impl From<&Projectile> for ProjectileSnapshot {
    fn from(p: &Projectile) -> Self {
        Self {
            id: p.id,
            prefab: p.prefab.clone(),
            owner: p.owner(),
            origin: p.origin,
            position: p.position,
            heading: p.heading,
        }
    }
}
