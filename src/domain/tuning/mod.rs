// Gameplay tuning, kept separate from runtime/server configuration.

pub mod agent;
pub mod arena;
pub mod player;
pub mod projectile;

pub use agent::{AgentTuning, PatrolMode, PatrolTuning};
pub use arena::{ArenaLayout, Block};
pub use player::PlayerTuning;
pub use projectile::ProjectileTuning;

use serde::Deserialize;
use std::collections::BTreeMap;

/// Complete gameplay tuning for a room.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Spawnable projectile prefabs by name.
    pub projectiles: BTreeMap<String, ProjectileTuning>,
    pub agent: AgentTuning,
    pub player: PlayerTuning,
    pub arena: ArenaLayout,
}

impl Tuning {
    pub fn projectile(&self, prefab: &str) -> Option<&ProjectileTuning> {
        self.projectiles.get(prefab)
    }
}

impl Default for Tuning {
    fn default() -> Self {
        let mut projectiles = BTreeMap::new();
        projectiles.insert("Bullet".to_string(), ProjectileTuning::default());
        projectiles.insert(
            "EnemyProjectile".to_string(),
            ProjectileTuning {
                speed: 12.0,
                ..ProjectileTuning::default()
            },
        );
        Self {
            projectiles,
            agent: AgentTuning::default(),
            player: PlayerTuning::default(),
            arena: ArenaLayout::default(),
        }
    }
}
