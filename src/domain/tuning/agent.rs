use glam::Vec3;
use serde::Deserialize;

/// Gameplay tuning for hostile agents.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AgentTuning {
    pub max_health: f32,

    /// Maximum distance at which a player can be targeted.
    pub detection_range: f32,

    /// Seconds between shots.
    pub fire_rate: f32,

    /// Aim tracking speed in degrees per second.
    pub turn_rate_degrees: f32,

    /// Minimum `dot(forward, direction_to_target)` required to fire; `None` disables the check.
    pub alignment_threshold: Option<f32>,

    /// Prefab fired at targets; `None` leaves the agent unable to shoot.
    pub projectile_prefab: Option<String>,

    /// Muzzle position relative to the agent, in its local frame (+Z forward).
    pub fire_point: Option<Vec3>,

    /// World-space collision radius.
    pub radius: f32,

    pub patrol: PatrolTuning,
}

impl Default for AgentTuning {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            detection_range: 10.0,
            fire_rate: 1.0,
            turn_rate_degrees: 120.0,
            alignment_threshold: Some(0.8),
            projectile_prefab: Some("EnemyProjectile".to_string()),
            fire_point: Some(Vec3::new(0.0, 0.5, 0.8)),
            radius: 0.5,
            patrol: PatrolTuning::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatrolMode {
    Static,
    LeftRight,
    /// Declared but without a path; behaves as `Static`.
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct PatrolTuning {
    pub mode: PatrolMode,

    /// Patrol speed in world units per second.
    pub speed: f32,

    /// Maximum offset from the start position along the patrol axis.
    pub distance: f32,

    /// Length of the downward probe at the next position.
    pub ground_probe: f32,

    /// Length of the forward obstacle probe.
    pub obstacle_probe: f32,
}

impl Default for PatrolTuning {
    fn default() -> Self {
        Self {
            mode: PatrolMode::Static,
            speed: 2.0,
            distance: 5.0,
            ground_probe: 1.5,
            obstacle_probe: 1.0,
        }
    }
}
