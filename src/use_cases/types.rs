// Use-case level messages exchanged between rooms, participants and the host.

use crate::domain::{
    AgentSnapshot, AuthorityChange, EntityId, Invocation, ParticipantId, PlayerSnapshot,
    ProjectileSnapshot, TransferPolicy,
};
use glam::Vec3;
use tokio::sync::mpsc;

/// What a spawn instantiates on each participant.
#[derive(Debug, Clone, PartialEq)]
pub enum SpawnKind {
    Player { display_name: String },
    /// Current health travels with the record so late joiners see the same value.
    Agent { health: f32 },
    Projectile { prefab: String },
}

impl SpawnKind {
    pub fn policy(&self) -> TransferPolicy {
        match self {
            SpawnKind::Agent { .. } => TransferPolicy::Takeover,
            SpawnKind::Player { .. } | SpawnKind::Projectile { .. } => TransferPolicy::Fixed,
        }
    }
}

/// A replicated instantiation, as cached by the room and replayed to late joiners.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnRecord {
    pub id: EntityId,
    pub kind: SpawnKind,
    /// Current authority holder.
    pub owner: ParticipantId,
    pub position: Vec3,
    pub heading: Vec3,
    pub origin: Option<EntityId>,
}

/// Ordered replication traffic fanned out by a room.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplicaOp {
    Spawn(SpawnRecord),
    Destroy { entity: EntityId },
    Invoke(Invocation),
    Authority(AuthorityChange),
    Transform {
        entity: EntityId,
        position: Vec3,
        yaw: f32,
    },
}

/// Traffic a participant submits to its room.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Publish(ReplicaOp),
    RequestAuthority(EntityId),
}

/// A replica op addressed to one participant.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub to: ParticipantId,
    pub op: ReplicaOp,
}

#[derive(Debug)]
pub enum RoomCommand {
    Join {
        participant: ParticipantId,
        display_name: String,
        link: mpsc::UnboundedSender<ReplicaOp>,
    },
    Leave {
        participant: ParticipantId,
    },
    Submit {
        sender: ParticipantId,
        outbound: Outbound,
    },
}

/// Input from the connected client driving a participant's avatar.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    Transform { position: Vec3, yaw: f32 },
    Fire { yaw: f32 },
}

/// One participant's view of the world after a tick.
#[derive(Debug, Clone)]
pub struct WorldUpdate {
    pub tick: u64,
    pub participant: ParticipantId,
    pub players: Vec<PlayerSnapshot>,
    pub agents: Vec<AgentSnapshot>,
    pub projectiles: Vec<ProjectileSnapshot>,
}
