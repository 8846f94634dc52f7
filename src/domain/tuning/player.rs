use serde::Deserialize;

/// Gameplay tuning for player avatars.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    /// World-space collision radius.
    pub radius: f32,

    /// Prefab spawned when the player fires.
    pub bullet_prefab: String,

    /// Height above the avatar origin where bullets spawn.
    pub muzzle_height: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            radius: 0.5,
            bullet_prefab: "Bullet".to_string(),
            muzzle_height: 0.5,
        }
    }
}
