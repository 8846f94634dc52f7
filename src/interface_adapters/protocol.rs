// Wire protocol DTOs and conversions for public game server messages.

use crate::domain::{AgentSnapshot, AgentState, PlayerSnapshot, ProjectileSnapshot};
use crate::domain::entity::yaw_from_direction;
use crate::use_cases::{ClientEvent, WorldUpdate};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    // Assigned identity for the connection after Join is accepted.
    Identity { participant_id: u64, player_id: u64 },
    // This participant's view of the world for a given tick.
    WorldUpdate(WorldUpdateDto),
}

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    // Initial handshake message.
    Join(JoinPayload),
    // Authoritative avatar transform, sent by the owning client.
    Transform(TransformDto),
    Fire(FireDto),
}

#[derive(Debug, Clone, Deserialize)]
pub struct JoinPayload {
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TransformDto {
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    pub z: f32,
    #[serde(default)]
    pub yaw: f32,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FireDto {
    pub yaw: f32,
}

impl From<TransformDto> for ClientEvent {
    fn from(t: TransformDto) -> Self {
        ClientEvent::Transform {
            position: Vec3::new(t.x, t.y, t.z),
            yaw: t.yaw,
        }
    }
}

impl From<FireDto> for ClientEvent {
    fn from(f: FireDto) -> Self {
        ClientEvent::Fire { yaw: f.yaw }
    }
}

/// Snapshot of the world sent to one client on each tick.
#[derive(Debug, Clone, Serialize)]
pub struct WorldUpdateDto {
    pub tick: u64,
    pub participant_id: u64,
    pub players: Vec<PlayerStateDto>,
    pub agents: Vec<AgentStateDto>,
    pub projectiles: Vec<ProjectileStateDto>,
}

impl From<WorldUpdate> for WorldUpdateDto {
    fn from(update: WorldUpdate) -> Self {
        Self {
            tick: update.tick,
            participant_id: update.participant.0,
            players: update
                .players
                .iter()
                .map(|p| PlayerStateDto::new(p, p.owner == update.participant))
                .collect(),
            agents: update.agents.iter().map(AgentStateDto::from).collect(),
            projectiles: update
                .projectiles
                .iter()
                .map(ProjectileStateDto::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerStateDto {
    pub id: u64,
    pub display_name: String,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub yaw: f32,
    // Lets clients label their own avatar apart from remote ones.
    pub is_local: bool,
}

impl PlayerStateDto {
    fn new(player: &PlayerSnapshot, is_local: bool) -> Self {
        Self {
            id: player.id.0,
            display_name: player.display_name.clone(),
            x: player.position.x,
            y: player.position.y,
            z: player.position.z,
            yaw: player.yaw,
            is_local,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentStateDto {
    pub id: u64,
    pub authority_id: u64,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub yaw: f32,
    pub hp: f32,
    pub max_hp: f32,
    pub state: &'static str,
}

impl From<&AgentSnapshot> for AgentStateDto {
    fn from(agent: &AgentSnapshot) -> Self {
        Self {
            id: agent.id.0,
            authority_id: agent.authority.0,
            x: agent.position.x,
            y: agent.position.y,
            z: agent.position.z,
            yaw: agent.yaw,
            hp: agent.health,
            max_hp: agent.max_health,
            state: match agent.state {
                AgentState::Idle => "idle",
                AgentState::Patrolling => "patrolling",
                AgentState::Tracking => "tracking",
                AgentState::Firing => "firing",
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectileStateDto {
    pub id: u64,
    pub prefab: String,
    pub owner_id: Option<u64>,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub yaw: f32,
}

impl From<&ProjectileSnapshot> for ProjectileStateDto {
    fn from(projectile: &ProjectileSnapshot) -> Self {
        Self {
            id: projectile.id.0,
            prefab: projectile.prefab.clone(),
            owner_id: projectile.owner.map(|owner| owner.0),
            x: projectile.position.x,
            y: projectile.position.y,
            z: projectile.position.z,
            yaw: yaw_from_direction(projectile.heading),
        }
    }
}
