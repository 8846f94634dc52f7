use serde::Deserialize;

/// Gameplay tuning for one projectile prefab.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProjectileTuning {
    /// Forward speed in world units per second.
    pub speed: f32,

    /// Lifetime in seconds before the authority despawns the projectile.
    pub life_time: f32,

    /// World-space collision radius.
    pub radius: f32,
}

impl Default for ProjectileTuning {
    fn default() -> Self {
        Self {
            speed: 20.0,
            life_time: 1.0,
            radius: 0.15,
        }
    }
}
