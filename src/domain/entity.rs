// Identity, category tags and orientation helpers shared by every replicated entity.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};
use std::fmt;

/// A participant in the replicated simulation.
///
/// `ParticipantId::ROOM` owns scene entities until a participant adopts them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticipantId(pub u64);

impl ParticipantId {
    pub const ROOM: Self = Self(0);

    pub fn is_room(self) -> bool {
        self == Self::ROOM
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a replicated (or local-only) entity.
///
/// Replicated ids are minted as `owner * ID_BLOCK + sequence`, so participants never
/// need to coordinate id allocation. Id `0` is an invalid handle and ids with the high
/// bit set never leave the participant that created them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl EntityId {
    pub const INVALID: Self = Self(0);

    /// Number of ids reserved for each participant.
    pub const ID_BLOCK: u64 = 1_000_000;

    const LOCAL_BIT: u64 = 1 << 63;

    /// Composes a replicated id from its minting participant and a 1-based sequence.
    pub fn compose(owner: ParticipantId, sequence: u64) -> Self {
        Self(owner.0 * Self::ID_BLOCK + sequence % Self::ID_BLOCK)
    }

    /// Builds an id that is only meaningful to the local participant.
    pub fn local(sequence: u64) -> Self {
        Self(Self::LOCAL_BIT | sequence)
    }

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }

    /// True when the id can be addressed through the transport.
    pub fn is_replicated(self) -> bool {
        self.is_valid() && self.0 & Self::LOCAL_BIT == 0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_replicated() || !self.is_valid() {
            write!(f, "{}", self.0)
        } else {
            write!(f, "local:{}", self.0 & !Self::LOCAL_BIT)
        }
    }
}

/// Category tag carried by contact events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tag {
    Player,
    Enemy,
    Wall,
    Obstacle,
    Bullet,
    Untagged,
}

/// Unit forward vector for a yaw about the vertical axis (yaw 0 faces +Z).
pub fn forward_from_yaw(yaw: f32) -> Vec3 {
    Vec3::new(yaw.sin(), 0.0, yaw.cos())
}

/// Yaw of the horizontal component of `direction`.
pub fn yaw_from_direction(direction: Vec3) -> f32 {
    direction.x.atan2(direction.z)
}

/// Wraps an angle into `(-PI, PI]`.
pub fn wrap_angle(angle: f32) -> f32 {
    if angle > -PI && angle <= PI {
        return angle;
    }
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI { wrapped + TAU } else { wrapped }
}
