use crate::domain::contact::{Body, Contact, ContactQueue};
use crate::domain::entity::{EntityId, Tag};
use crate::domain::ports::{ContactSource, WorldQuery};
use crate::domain::tuning::{ArenaLayout, Block};
use glam::Vec3;
use std::collections::HashSet;

const EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Touching {
    Body(EntityId),
    Wall(usize),
    Obstacle(usize),
}

/// Naive arena physics: a flat floor plus axis-aligned walls and obstacles.
///
/// Only `Bullet` bodies carry trigger volumes, so every contact involves at least one
/// bullet. Contacts are reported once when an overlap starts.
#[derive(Debug)]
pub struct ArenaPhysics {
    layout: ArenaLayout,
    touching: HashSet<(EntityId, Touching)>,
}

impl ArenaPhysics {
    pub fn new(layout: ArenaLayout) -> Self {
        Self {
            layout,
            touching: HashSet::new(),
        }
    }

    pub fn layout(&self) -> &ArenaLayout {
        &self.layout
    }

    fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.layout.walls.iter().chain(self.layout.obstacles.iter())
    }
}

impl WorldQuery for ArenaPhysics {
    fn has_ground_below(&self, point: Vec3, max_distance: f32) -> bool {
        let e = self.layout.half_extent;
        let on_floor = point.x.abs() <= e && point.z.abs() <= e;
        if on_floor && point.y >= -EPSILON && point.y <= max_distance {
            return true;
        }

        self.blocks().any(|block| {
            let above = point.y >= block.max.y - EPSILON;
            above
                && point.y - block.max.y <= max_distance
                && (block.min.x..=block.max.x).contains(&point.x)
                && (block.min.z..=block.max.z).contains(&point.z)
        })
    }

    fn is_obstructed(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> bool {
        let Some(direction) = direction.try_normalize() else {
            return false;
        };
        self.blocks()
            .any(|block| ray_hits(block, origin, direction, max_distance))
    }
}

impl ContactSource for ArenaPhysics {
    fn collect_contacts(&mut self, bodies: &[Body], queue: &mut ContactQueue) {
        let mut current = HashSet::new();

        for body in bodies.iter().filter(|b| b.tag == Tag::Bullet) {
            let walls = self.layout.walls.iter().enumerate();
            for (index, block) in walls {
                if sphere_overlaps(block, body.position, body.radius) {
                    current.insert((body.id, Touching::Wall(index)));
                }
            }
            let obstacles = self.layout.obstacles.iter().enumerate();
            for (index, block) in obstacles {
                if sphere_overlaps(block, body.position, body.radius) {
                    current.insert((body.id, Touching::Obstacle(index)));
                }
            }
        }

        for (i, a) in bodies.iter().enumerate() {
            for b in &bodies[i + 1..] {
                if a.tag != Tag::Bullet && b.tag != Tag::Bullet {
                    continue;
                }
                if a.ignore == Some(b.id) || b.ignore == Some(a.id) {
                    continue;
                }
                let reach = a.radius + b.radius;
                if a.position.distance_squared(b.position) <= reach * reach {
                    current.insert((a.id, Touching::Body(b.id)));
                    current.insert((b.id, Touching::Body(a.id)));
                }
            }
        }

        // Iterate bodies in order so contacts come out deterministically.
        for body in bodies {
            let started = current
                .iter()
                .filter(|(entity, _)| *entity == body.id)
                .filter(|key| !self.touching.contains(*key));
            let mut entered: Vec<Touching> = started.map(|(_, touching)| *touching).collect();
            entered.sort_by_key(|touching| order_key(touching, bodies));

            for touching in entered {
                let (other, other_tag) = match touching {
                    Touching::Wall(_) => (None, Tag::Wall),
                    Touching::Obstacle(_) => (None, Tag::Obstacle),
                    Touching::Body(other) => {
                        let tag = bodies
                            .iter()
                            .find(|b| b.id == other)
                            .map(|b| b.tag)
                            .unwrap_or(Tag::Untagged);
                        (Some(other), tag)
                    }
                };
                queue.push(Contact {
                    entity: body.id,
                    other,
                    other_tag,
                });
            }
        }

        self.touching = current;
    }
}

fn order_key(touching: &Touching, bodies: &[Body]) -> (u8, usize) {
    match touching {
        Touching::Wall(index) => (0, *index),
        Touching::Obstacle(index) => (1, *index),
        Touching::Body(id) => (2, bodies.iter().position(|b| b.id == *id).unwrap_or(usize::MAX)),
    }
}

fn sphere_overlaps(block: &Block, center: Vec3, radius: f32) -> bool {
    let closest = center.max(block.min).min(block.max);
    closest.distance_squared(center) <= radius * radius
}

// Slab test; a ray starting inside the block counts as obstructed.
fn ray_hits(block: &Block, origin: Vec3, direction: Vec3, max_distance: f32) -> bool {
    let mut t_enter = 0.0_f32;
    let mut t_exit = max_distance;

    for axis in 0..3 {
        let o = origin[axis];
        let d = direction[axis];
        let (lo, hi) = (block.min[axis], block.max[axis]);

        if d.abs() < EPSILON {
            if o < lo || o > hi {
                return false;
            }
            continue;
        }

        let mut t0 = (lo - o) / d;
        let mut t1 = (hi - o) / d;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_enter = t_enter.max(t0);
        t_exit = t_exit.min(t1);
        if t_enter > t_exit {
            return false;
        }
    }
    true
}
