use glam::Vec3;
use serde::Deserialize;

/// Axis-aligned box of level geometry.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Block {
    pub min: Vec3,
    pub max: Vec3,
}

impl Block {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }
}

/// Static arena layout: floor, walls, obstacles and spawn points.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ArenaLayout {
    /// The floor spans `[-half_extent, half_extent]` on X and Z at height 0.
    pub half_extent: f32,
    pub walls: Vec<Block>,
    pub obstacles: Vec<Block>,
    pub agent_spawns: Vec<Vec3>,
    pub player_spawns: Vec<Vec3>,
}

impl Default for ArenaLayout {
    fn default() -> Self {
        let e = 20.0;
        let h = 3.0;
        let t = 0.5;
        Self {
            half_extent: e,
            walls: vec![
                Block::new(Vec3::new(-e, 0.0, e - t), Vec3::new(e, h, e)),
                Block::new(Vec3::new(-e, 0.0, -e), Vec3::new(e, h, -e + t)),
                Block::new(Vec3::new(e - t, 0.0, -e), Vec3::new(e, h, e)),
                Block::new(Vec3::new(-e, 0.0, -e), Vec3::new(-e + t, h, e)),
            ],
            obstacles: vec![
                Block::new(Vec3::new(-6.0, 0.0, -1.0), Vec3::new(-4.0, 1.5, 1.0)),
                Block::new(Vec3::new(4.0, 0.0, -1.0), Vec3::new(6.0, 1.5, 1.0)),
                Block::new(Vec3::new(-1.0, 0.0, 8.0), Vec3::new(1.0, 2.0, 10.0)),
            ],
            agent_spawns: vec![
                Vec3::new(0.0, 0.0, 14.0),
                Vec3::new(-12.0, 0.0, -10.0),
                Vec3::new(12.0, 0.0, -10.0),
            ],
            player_spawns: vec![
                Vec3::new(0.0, 0.0, -15.0),
                Vec3::new(-15.0, 0.0, 0.0),
                Vec3::new(15.0, 0.0, 0.0),
                Vec3::new(0.0, 0.0, 4.0),
            ],
        }
    }
}
