// Contact events and the per-tick queue the simulation drains after movement.

use crate::domain::entity::{EntityId, Tag};
use glam::Vec3;
use std::collections::VecDeque;

/// A collision volume the physics layer checks for overlaps.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub id: EntityId,
    pub tag: Tag,
    pub position: Vec3,
    pub radius: f32,
    /// Entity this body must never report contacts with (a projectile's shooter).
    pub ignore: Option<EntityId>,
}

/// `entity` started touching `other`.
///
/// `other` is `None` for static level geometry, which has no entity identity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub entity: EntityId,
    pub other: Option<EntityId>,
    pub other_tag: Tag,
}

#[derive(Debug, Default)]
pub struct ContactQueue {
    pending: VecDeque<Contact>,
}

impl ContactQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, contact: Contact) {
        self.pending.push_back(contact);
    }

    pub fn pop(&mut self) -> Option<Contact> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
