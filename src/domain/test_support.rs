use std::collections::HashSet;

use glam::Vec3;

use crate::domain::damage::{RemoteCall, RpcTarget};
use crate::domain::entity::{EntityId, ParticipantId};
use crate::domain::errors::SpawnError;
use crate::domain::ports::{Replication, WorldQuery};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RecordedCall {
    Spawn {
        id: EntityId,
        prefab: String,
        position: Vec3,
        heading: Vec3,
        origin: Option<EntityId>,
    },
    Destroy {
        entity: EntityId,
    },
    Invoke {
        entity: EntityId,
        call: RemoteCall,
        target: RpcTarget,
    },
    RequestAuthority {
        entity: EntityId,
    },
}

// Transport double that records every call and answers authority from a fixed set.
pub(crate) struct RecordingReplication {
    local: ParticipantId,
    pub(crate) owned: HashSet<EntityId>,
    pub(crate) prefabs: HashSet<String>,
    pub(crate) calls: Vec<RecordedCall>,
    next_sequence: u64,
}

impl RecordingReplication {
    pub(crate) fn new(local: ParticipantId) -> Self {
        Self {
            local,
            owned: HashSet::new(),
            prefabs: ["Bullet", "EnemyProjectile"]
                .into_iter()
                .map(String::from)
                .collect(),
            calls: Vec::new(),
            next_sequence: 0,
        }
    }

    pub(crate) fn owning(mut self, entity: EntityId) -> Self {
        self.owned.insert(entity);
        self
    }

    pub(crate) fn destroys(&self) -> Vec<EntityId> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                RecordedCall::Destroy { entity } => Some(*entity),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn damage_calls(&self) -> Vec<(EntityId, f32)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                RecordedCall::Invoke {
                    entity,
                    call: RemoteCall::TakeDamage { amount },
                    ..
                } => Some((*entity, *amount)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn spawns(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, RecordedCall::Spawn { .. }))
            .count()
    }
}

impl Replication for RecordingReplication {
    fn local_participant(&self) -> ParticipantId {
        self.local
    }

    fn spawn_replicated(
        &mut self,
        prefab: &str,
        position: Vec3,
        heading: Vec3,
        origin: Option<EntityId>,
    ) -> Result<EntityId, SpawnError> {
        if !self.prefabs.contains(prefab) {
            return Err(SpawnError::UnknownPrefab(prefab.to_string()));
        }
        self.next_sequence += 1;
        let id = EntityId::compose(self.local, self.next_sequence);
        self.owned.insert(id);
        self.calls.push(RecordedCall::Spawn {
            id,
            prefab: prefab.to_string(),
            position,
            heading,
            origin,
        });
        Ok(id)
    }

    fn destroy_replicated(&mut self, entity: EntityId) {
        self.calls.push(RecordedCall::Destroy { entity });
    }

    fn invoke_remote(&mut self, entity: EntityId, call: RemoteCall, target: RpcTarget) {
        self.calls.push(RecordedCall::Invoke {
            entity,
            call,
            target,
        });
    }

    fn is_authority(&self, entity: EntityId) -> bool {
        self.owned.contains(&entity)
    }

    fn request_authority(&mut self, entity: EntityId) {
        self.calls.push(RecordedCall::RequestAuthority { entity });
    }
}

// Fixed answers for ground and obstacle probes.
pub(crate) struct FlatWorld {
    pub(crate) ground: bool,
    pub(crate) blocked: bool,
}

impl FlatWorld {
    pub(crate) fn open() -> Self {
        Self {
            ground: true,
            blocked: false,
        }
    }
}

impl WorldQuery for FlatWorld {
    fn has_ground_below(&self, _point: Vec3, _max_distance: f32) -> bool {
        self.ground
    }

    fn is_obstructed(&self, _origin: Vec3, _direction: Vec3, _max_distance: f32) -> bool {
        self.blocked
    }
}
