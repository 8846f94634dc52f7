// Participant-side replication: a local authority replica plus an outbox for the room.

use crate::domain::{
    AuthorityTable, EntityId, Invocation, ParticipantId, RemoteCall, Replication, RpcTarget,
    SpawnError, TransferPolicy,
};
use crate::use_cases::types::{Outbound, ReplicaOp, SpawnKind, SpawnRecord};
use glam::Vec3;
use std::collections::BTreeSet;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct ParticipantNet {
    local: ParticipantId,
    authority: AuthorityTable,
    prefabs: BTreeSet<String>,
    next_sequence: u64,
    outbox: Vec<Outbound>,
    // Local spawns and destroys not yet applied to the entity registry.
    spawned: Vec<SpawnRecord>,
    destroyed: Vec<EntityId>,
}

impl ParticipantNet {
    pub fn new(local: ParticipantId, prefabs: impl IntoIterator<Item = String>) -> Self {
        Self {
            local,
            authority: AuthorityTable::new(),
            prefabs: prefabs.into_iter().collect(),
            next_sequence: 0,
            outbox: Vec::new(),
            spawned: Vec::new(),
            destroyed: Vec::new(),
        }
    }

    pub fn owner_of(&self, entity: EntityId) -> Option<ParticipantId> {
        self.authority.owner_of(entity)
    }

    /// Updates the authority replica from an op delivered by the room.
    pub fn observe(&mut self, op: &ReplicaOp) {
        match op {
            ReplicaOp::Spawn(record) => {
                self.authority
                    .assign(record.id, record.owner, record.kind.policy());
            }
            ReplicaOp::Destroy { entity } => {
                self.authority.release(*entity);
            }
            ReplicaOp::Authority(change) => {
                if !self.authority.set_owner(change.entity, change.owner) {
                    debug!(entity = %change.entity, "authority change for unknown entity");
                }
            }
            ReplicaOp::Invoke(_) | ReplicaOp::Transform { .. } => {}
        }
    }

    /// Queues the current transform of an owned entity.
    pub fn publish_transform(&mut self, entity: EntityId, position: Vec3, yaw: f32) {
        if self.is_authority(entity) {
            self.outbox.push(Outbound::Publish(ReplicaOp::Transform {
                entity,
                position,
                yaw,
            }));
        }
    }

    pub fn drain_outbox(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.outbox)
    }

    pub fn take_spawned(&mut self) -> Vec<SpawnRecord> {
        std::mem::take(&mut self.spawned)
    }

    pub fn take_destroyed(&mut self) -> Vec<EntityId> {
        std::mem::take(&mut self.destroyed)
    }
}

impl Replication for ParticipantNet {
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
        self.authority.assign(id, self.local, TransferPolicy::Fixed);

        let record = SpawnRecord {
            id,
            kind: SpawnKind::Projectile {
                prefab: prefab.to_string(),
            },
            owner: self.local,
            position,
            heading,
            origin,
        };
        self.outbox
            .push(Outbound::Publish(ReplicaOp::Spawn(record.clone())));
        self.spawned.push(record);
        Ok(id)
    }

    fn destroy_replicated(&mut self, entity: EntityId) {
        if !self.is_authority(entity) {
            warn!(%entity, participant = %self.local, "destroy without authority ignored");
            return;
        }
        self.authority.release(entity);
        self.outbox
            .push(Outbound::Publish(ReplicaOp::Destroy { entity }));
        self.destroyed.push(entity);
    }

    fn invoke_remote(&mut self, entity: EntityId, call: RemoteCall, target: RpcTarget) {
        self.outbox
            .push(Outbound::Publish(ReplicaOp::Invoke(Invocation {
                entity,
                call,
                target,
                sender: self.local,
            })));
    }

    fn is_authority(&self, entity: EntityId) -> bool {
        self.authority.is_authority(entity, self.local)
    }

    fn request_authority(&mut self, entity: EntityId) {
        self.outbox.push(Outbound::RequestAuthority(entity));
    }
}
