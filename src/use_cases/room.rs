// Room: the in-process replication transport and authority arbiter.
//
// `RoomState` is a synchronous state machine that turns participant traffic into ordered
// deliveries. `room_task` is the single consumer that drives it, so every authority
// decision for a room is serialised.

use crate::domain::entity::forward_from_yaw;
use crate::domain::player::avatar_id;
use crate::domain::{
    AuthorityChange, AuthorityTable, EntityId, ParticipantId, RemoteCall, TransferPolicy, Tuning,
};
use crate::use_cases::types::{Delivery, Outbound, ReplicaOp, RoomCommand, SpawnKind, SpawnRecord};
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, HashMap};
use std::f32::consts::PI;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub struct RoomState {
    room_id: Arc<str>,
    tuning: Arc<Tuning>,
    authority: AuthorityTable,
    // Instantiation cache replayed to late joiners.
    cache: BTreeMap<EntityId, SpawnRecord>,
    members: BTreeMap<ParticipantId, String>,
    joins: usize,
}

impl RoomState {
    /// Creates a room and places the scene's hostile agents, owned by the room.
    pub fn new(room_id: Arc<str>, tuning: Arc<Tuning>, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut authority = AuthorityTable::new();
        let mut cache = BTreeMap::new();

        for (index, position) in tuning.arena.agent_spawns.iter().enumerate() {
            let id = EntityId::compose(ParticipantId::ROOM, index as u64 + 1);
            let yaw = rng.gen_range(-PI..PI);
            let record = SpawnRecord {
                id,
                kind: SpawnKind::Agent {
                    health: tuning.agent.max_health,
                },
                owner: ParticipantId::ROOM,
                position: *position,
                heading: forward_from_yaw(yaw),
                origin: None,
            };
            authority.assign(id, ParticipantId::ROOM, record.kind.policy());
            cache.insert(id, record);
        }

        Self {
            room_id,
            tuning,
            authority,
            cache,
            members: BTreeMap::new(),
            joins: 0,
        }
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn participants(&self) -> impl Iterator<Item = ParticipantId> + '_ {
        self.members.keys().copied()
    }

    pub fn owner_of(&self, entity: EntityId) -> Option<ParticipantId> {
        self.authority.owner_of(entity)
    }

    pub fn cached(&self, entity: EntityId) -> Option<&SpawnRecord> {
        self.cache.get(&entity)
    }

    pub fn entity_count(&self) -> usize {
        self.cache.len()
    }

    /// Admits a participant: replays every live entity to it, then spawns its avatar.
    pub fn join(&mut self, participant: ParticipantId, display_name: String) -> Vec<Delivery> {
        if participant.is_room() || self.members.contains_key(&participant) {
            warn!(room_id = %self.room_id, %participant, "duplicate join ignored");
            return Vec::new();
        }

        let mut deliveries: Vec<Delivery> = self
            .cache
            .values()
            .map(|record| Delivery {
                to: participant,
                op: ReplicaOp::Spawn(record.clone()),
            })
            .collect();

        self.members.insert(participant, display_name.clone());

        let spawns = &self.tuning.arena.player_spawns;
        let position = if spawns.is_empty() {
            Vec3::ZERO
        } else {
            spawns[self.joins % spawns.len()]
        };
        self.joins += 1;

        let record = SpawnRecord {
            id: avatar_id(participant),
            kind: SpawnKind::Player { display_name },
            owner: participant,
            position,
            heading: Vec3::Z,
            origin: None,
        };
        self.authority
            .assign(record.id, participant, record.kind.policy());
        self.cache.insert(record.id, record.clone());
        deliveries.extend(self.to_all(ReplicaOp::Spawn(record)));

        info!(room_id = %self.room_id, %participant, members = self.members.len(), "participant joined");
        deliveries
    }

    /// Removes a participant, destroying what it created and migrating what it adopted.
    pub fn leave(&mut self, participant: ParticipantId) -> Vec<Delivery> {
        if self.members.remove(&participant).is_none() {
            return Vec::new();
        }

        let mut deliveries = Vec::new();
        for entity in self.authority.owned_by(participant) {
            if self.authority.policy_of(entity) == Some(TransferPolicy::Fixed) {
                self.authority.release(entity);
                self.cache.remove(&entity);
                deliveries.extend(self.to_all(ReplicaOp::Destroy { entity }));
            }
        }

        let successor = self
            .members
            .keys()
            .next()
            .copied()
            .unwrap_or(ParticipantId::ROOM);
        for change in self.authority.migrate(participant, successor) {
            self.record_owner(&change);
            info!(entity = %change.entity, from = %change.previous, to = %change.owner, "authority migrated");
            deliveries.extend(self.to_all(ReplicaOp::Authority(change)));
        }

        info!(room_id = %self.room_id, %participant, members = self.members.len(), "participant left");
        deliveries
    }

    /// Validates and fans out one piece of participant traffic.
    pub fn submit(&mut self, sender: ParticipantId, outbound: Outbound) -> Vec<Delivery> {
        if !self.members.contains_key(&sender) {
            warn!(room_id = %self.room_id, %sender, "traffic from non-member dropped");
            return Vec::new();
        }

        match outbound {
            Outbound::RequestAuthority(entity) => self.request_authority(sender, entity),
            Outbound::Publish(ReplicaOp::Spawn(record)) => self.spawn(sender, record),
            Outbound::Publish(ReplicaOp::Destroy { entity }) => self.destroy(sender, entity),
            Outbound::Publish(ReplicaOp::Invoke(mut invocation)) => {
                invocation.sender = sender;
                if !self.cache.contains_key(&invocation.entity) {
                    debug!(entity = %invocation.entity, procedure = invocation.call.procedure(), "invocation for unknown entity dropped");
                    return Vec::new();
                }
                self.record_invocation(invocation.entity, invocation.call);
                self.members
                    .keys()
                    .filter(|member| invocation.target.includes(sender, **member))
                    .map(|member| Delivery {
                        to: *member,
                        op: ReplicaOp::Invoke(invocation),
                    })
                    .collect()
            }
            Outbound::Publish(ReplicaOp::Transform {
                entity,
                position,
                yaw,
            }) => {
                if !self.authority.is_authority(entity, sender) {
                    debug!(%entity, %sender, "transform from non-owner rejected");
                    return Vec::new();
                }
                if let Some(record) = self.cache.get_mut(&entity) {
                    record.position = position;
                    if !matches!(record.kind, SpawnKind::Projectile { .. }) {
                        record.heading = forward_from_yaw(yaw);
                    }
                }
                self.to_others(
                    sender,
                    ReplicaOp::Transform {
                        entity,
                        position,
                        yaw,
                    },
                )
            }
            Outbound::Publish(ReplicaOp::Authority(change)) => {
                warn!(entity = %change.entity, %sender, "authority changes are decided by the room");
                Vec::new()
            }
        }
    }

    fn spawn(&mut self, sender: ParticipantId, record: SpawnRecord) -> Vec<Delivery> {
        let in_block = record.id.0 / EntityId::ID_BLOCK == sender.0;
        let is_projectile = matches!(record.kind, SpawnKind::Projectile { .. });
        if !record.id.is_replicated() || !in_block || record.owner != sender || !is_projectile {
            warn!(entity = %record.id, %sender, "invalid spawn rejected");
            return Vec::new();
        }
        if self.cache.contains_key(&record.id) {
            warn!(entity = %record.id, %sender, "duplicate spawn rejected");
            return Vec::new();
        }

        self.authority
            .assign(record.id, sender, record.kind.policy());
        self.cache.insert(record.id, record.clone());
        self.to_others(sender, ReplicaOp::Spawn(record))
    }

    fn destroy(&mut self, sender: ParticipantId, entity: EntityId) -> Vec<Delivery> {
        match self.authority.owner_of(entity) {
            None => {
                debug!(%entity, %sender, "destroy of unknown entity ignored");
                Vec::new()
            }
            Some(owner) if owner != sender => {
                warn!(%entity, %sender, %owner, "destroy from non-owner rejected");
                Vec::new()
            }
            Some(_) => {
                self.authority.release(entity);
                self.cache.remove(&entity);
                debug!(%entity, %sender, "entity destroyed");
                self.to_others(sender, ReplicaOp::Destroy { entity })
            }
        }
    }

    fn request_authority(&mut self, requester: ParticipantId, entity: EntityId) -> Vec<Delivery> {
        match self.authority.request(entity, requester) {
            Ok(Some(change)) => {
                self.record_owner(&change);
                info!(%entity, from = %change.previous, to = %change.owner, "authority transferred");
                self.to_all(ReplicaOp::Authority(change))
            }
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(%entity, %requester, error = %e, "authority request denied");
                Vec::new()
            }
        }
    }

    fn record_owner(&mut self, change: &AuthorityChange) {
        if let Some(record) = self.cache.get_mut(&change.entity) {
            record.owner = change.owner;
        }
    }

    fn record_invocation(&mut self, entity: EntityId, call: RemoteCall) {
        let Some(record) = self.cache.get_mut(&entity) else {
            return;
        };
        if let (SpawnKind::Agent { health }, RemoteCall::TakeDamage { amount }) =
            (&mut record.kind, call)
        {
            *health -= amount;
        }
    }

    fn to_all(&self, op: ReplicaOp) -> Vec<Delivery> {
        self.members
            .keys()
            .map(|member| Delivery {
                to: *member,
                op: op.clone(),
            })
            .collect()
    }

    fn to_others(&self, sender: ParticipantId, op: ReplicaOp) -> Vec<Delivery> {
        self.members
            .keys()
            .filter(|member| **member != sender)
            .map(|member| Delivery {
                to: *member,
                op: op.clone(),
            })
            .collect()
    }
}

/// Drives a room until its command channel closes or, for unpinned rooms, the last
/// participant leaves.
pub async fn room_task(
    mut state: RoomState,
    mut commands: mpsc::UnboundedReceiver<RoomCommand>,
    pinned: bool,
) {
    let mut links: HashMap<ParticipantId, mpsc::UnboundedSender<ReplicaOp>> = HashMap::new();

    while let Some(command) = commands.recv().await {
        let (deliveries, left) = match command {
            RoomCommand::Join {
                participant,
                display_name,
                link,
            } => {
                links.insert(participant, link);
                (state.join(participant, display_name), false)
            }
            RoomCommand::Leave { participant } => {
                links.remove(&participant);
                (state.leave(participant), true)
            }
            RoomCommand::Submit { sender, outbound } => (state.submit(sender, outbound), false),
        };

        for delivery in deliveries {
            let Some(link) = links.get(&delivery.to) else {
                continue;
            };
            if link.send(delivery.op).is_err() {
                debug!(participant = %delivery.to, "participant link closed");
            }
        }

        if left && !pinned && state.is_empty() {
            info!(room_id = %state.room_id(), "room empty; shutting down");
            break;
        }
    }
}
