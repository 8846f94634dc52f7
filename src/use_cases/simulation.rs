// One participant's simulation: entity registry, explicit tick order and contact queue.
//
// Tick order: agents decide and fire, local spawns are materialized, projectiles move,
// physics reports newly started contacts, the queue is drained, then owned transforms
// are published. Inbound replica ops are applied by the caller before `step`.

use crate::domain::damage::deliver;
use crate::domain::entity::{wrap_angle, yaw_from_direction};
use crate::domain::player::avatar_id;
use crate::domain::{
    AgentSnapshot, Body, BulletContact, BulletResolution, ContactQueue, ContactTarget, EntityId,
    HostileAgent, Impact, ParticipantId, Physics, Player, PlayerSnapshot, Projectile,
    ProjectileSnapshot, Replication, Tag, Tuning,
};
use crate::use_cases::replica::ParticipantNet;
use crate::use_cases::types::{ClientEvent, Outbound, ReplicaOp, SpawnKind, SpawnRecord, WorldUpdate};
use glam::Vec3;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct Simulation<P: Physics> {
    net: ParticipantNet,
    physics: P,
    tuning: Arc<Tuning>,
    players: BTreeMap<EntityId, Player>,
    agents: BTreeMap<EntityId, HostileAgent>,
    projectiles: BTreeMap<EntityId, Projectile>,
    // Bullet bodies known locally without a projectile controller.
    loose: BTreeMap<EntityId, Body>,
    contacts: ContactQueue,
    clock: f32,
    tick: u64,
    next_local: u64,
}

impl<P: Physics> Simulation<P> {
    pub fn new(participant: ParticipantId, tuning: Arc<Tuning>, physics: P) -> Self {
        let prefabs = tuning.projectiles.keys().cloned();
        Self {
            net: ParticipantNet::new(participant, prefabs),
            physics,
            tuning,
            players: BTreeMap::new(),
            agents: BTreeMap::new(),
            projectiles: BTreeMap::new(),
            loose: BTreeMap::new(),
            contacts: ContactQueue::new(),
            clock: 0.0,
            tick: 0,
            next_local: 0,
        }
    }

    pub fn participant(&self) -> ParticipantId {
        self.net.local_participant()
    }

    pub fn player_id(&self) -> EntityId {
        avatar_id(self.participant())
    }

    pub fn now(&self) -> f32 {
        self.clock
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn is_authority(&self, entity: EntityId) -> bool {
        self.net.is_authority(entity)
    }

    pub fn player(&self, id: EntityId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn agent(&self, id: EntityId) -> Option<&HostileAgent> {
        self.agents.get(&id)
    }

    pub fn projectile(&self, id: EntityId) -> Option<&Projectile> {
        self.projectiles.get(&id)
    }

    pub fn projectile_ids(&self) -> Vec<EntityId> {
        self.projectiles.keys().copied().collect()
    }

    pub fn loose_bodies(&self) -> usize {
        self.loose.len()
    }

    /// Applies one op delivered by the room.
    pub fn apply(&mut self, op: ReplicaOp) {
        self.net.observe(&op);

        match op {
            ReplicaOp::Spawn(record) => self.materialize(record),
            ReplicaOp::Destroy { entity } => self.remove(entity),
            ReplicaOp::Invoke(invocation) => match self.agents.get_mut(&invocation.entity) {
                Some(agent) => {
                    let outcome = deliver(agent, invocation.call, &mut self.net);
                    debug!(
                        entity = %invocation.entity,
                        sender = %invocation.sender,
                        health = outcome.health,
                        "applied remote call"
                    );
                }
                None => {
                    debug!(entity = %invocation.entity, procedure = invocation.call.procedure(), "remote call for unknown receiver");
                }
            },
            ReplicaOp::Authority(change) => {
                if change.owner == self.participant() {
                    info!(entity = %change.entity, from = %change.previous, "authority acquired");
                }
            }
            ReplicaOp::Transform {
                entity,
                position,
                yaw,
            } => {
                if self.net.is_authority(entity) {
                    return;
                }
                if let Some(player) = self.players.get_mut(&entity) {
                    player.position = position;
                    player.yaw = yaw;
                } else if let Some(agent) = self.agents.get_mut(&entity) {
                    agent.position = position;
                    agent.yaw = yaw;
                } else if let Some(projectile) = self.projectiles.get_mut(&entity) {
                    projectile.position = position;
                }
            }
        }
    }

    /// Applies input for the local avatar.
    pub fn handle_client(&mut self, event: ClientEvent) {
        let id = self.player_id();
        let Some(player) = self.players.get_mut(&id) else {
            debug!(participant = %self.net.local_participant(), "input before avatar spawned");
            return;
        };

        match event {
            ClientEvent::Transform { position, yaw } => {
                if !position.is_finite() || !yaw.is_finite() {
                    warn!(player = %id, "non-finite transform dropped");
                    return;
                }
                player.position = position;
                player.yaw = wrap_angle(yaw);
            }
            ClientEvent::Fire { yaw } => {
                if !yaw.is_finite() {
                    warn!(player = %id, "non-finite fire yaw dropped");
                    return;
                }
                player.yaw = wrap_angle(yaw);
                let forward = player.forward();
                let muzzle = player.position
                    + Vec3::Y * self.tuning.player.muzzle_height
                    + forward * player.radius;
                let prefab = self.tuning.player.bullet_prefab.as_str();

                match self
                    .net
                    .spawn_replicated(prefab, muzzle, forward, Some(id))
                {
                    Ok(bullet) => debug!(player = %id, %bullet, "player fired"),
                    Err(e) => warn!(player = %id, error = %e, "failed to spawn bullet"),
                }
            }
        }
    }

    /// Registers a bullet body that exists only on this participant.
    pub fn add_loose_bullet(&mut self, position: Vec3, radius: f32) -> EntityId {
        self.next_local += 1;
        let id = EntityId::local(self.next_local);
        self.loose.insert(
            id,
            Body {
                id,
                tag: Tag::Bullet,
                position,
                radius,
                ignore: None,
            },
        );
        id
    }

    /// Advances the simulation by `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        let now = self.clock;

        let roster: Vec<Player> = self.players.values().cloned().collect();
        for agent in self.agents.values_mut() {
            agent.tick(dt, now, &roster, &self.physics, &mut self.net);
        }
        self.reap();

        for record in self.net.take_spawned() {
            self.materialize(record);
        }

        for projectile in self.projectiles.values_mut() {
            projectile.tick(dt, now, &mut self.net);
        }

        let bodies = self.bodies();
        self.physics.collect_contacts(&bodies, &mut self.contacts);
        self.dispatch_contacts();
        self.reap();

        self.publish_transforms();

        self.clock += dt;
        self.tick += 1;
    }

    /// Traffic queued for the room since the last flush.
    pub fn flush(&mut self) -> Vec<Outbound> {
        self.net.drain_outbox()
    }

    pub fn snapshot(&self) -> WorldUpdate {
        WorldUpdate {
            tick: self.tick,
            participant: self.participant(),
            players: self.players.values().map(PlayerSnapshot::from).collect(),
            agents: self
                .agents
                .values()
                .map(|agent| {
                    let authority = self
                        .net
                        .owner_of(agent.id)
                        .unwrap_or(ParticipantId::ROOM);
                    AgentSnapshot::new(agent, authority)
                })
                .collect(),
            projectiles: self
                .projectiles
                .values()
                .filter(|p| !p.is_spent())
                .map(ProjectileSnapshot::from)
                .collect(),
        }
    }

    fn materialize(&mut self, record: SpawnRecord) {
        let known = self.players.contains_key(&record.id)
            || self.agents.contains_key(&record.id)
            || self.projectiles.contains_key(&record.id)
            || self.loose.contains_key(&record.id);
        if known {
            debug!(entity = %record.id, "spawn for known entity ignored");
            return;
        }

        let yaw = yaw_from_direction(record.heading);
        match record.kind {
            SpawnKind::Player { display_name } => {
                self.players.insert(
                    record.id,
                    Player {
                        id: record.id,
                        owner: record.owner,
                        display_name,
                        position: record.position,
                        yaw,
                        radius: self.tuning.player.radius,
                    },
                );
            }
            SpawnKind::Agent { health } => {
                let mut agent =
                    HostileAgent::new(record.id, record.position, yaw, self.tuning.agent.clone())
                        .with_health(health);
                agent.on_spawn(&mut self.net);
                self.agents.insert(record.id, agent);
            }
            SpawnKind::Projectile { prefab } => match self.tuning.projectile(&prefab) {
                Some(tuning) => {
                    let mut projectile = Projectile::spawned(
                        record.id,
                        prefab,
                        tuning,
                        record.position,
                        record.heading,
                        record.origin,
                        self.clock,
                    );
                    projectile.initialize(tuning.speed, record.owner);
                    self.projectiles.insert(record.id, projectile);
                }
                None => {
                    warn!(entity = %record.id, %prefab, "no controller for prefab; tracking as loose body");
                    self.loose.insert(
                        record.id,
                        Body {
                            id: record.id,
                            tag: Tag::Bullet,
                            position: record.position,
                            radius: crate::domain::tuning::ProjectileTuning::default().radius,
                            ignore: record.origin,
                        },
                    );
                }
            },
        }
    }

    fn remove(&mut self, entity: EntityId) {
        let removed = self.players.remove(&entity).is_some()
            | self.agents.remove(&entity).is_some()
            | self.projectiles.remove(&entity).is_some()
            | self.loose.remove(&entity).is_some();
        if !removed {
            debug!(%entity, "destroy for unknown entity");
        }
    }

    // Applies destroys this participant issued during the tick.
    fn reap(&mut self) {
        for entity in self.net.take_destroyed() {
            self.remove(entity);
        }
    }

    fn bodies(&self) -> Vec<Body> {
        let players = self.players.values().map(|p| Body {
            id: p.id,
            tag: Tag::Player,
            position: p.position,
            radius: p.radius,
            ignore: None,
        });
        let agents = self.agents.values().map(|a| Body {
            id: a.id,
            tag: Tag::Enemy,
            position: a.position,
            radius: a.radius(),
            ignore: None,
        });
        let projectiles = self
            .projectiles
            .values()
            .filter(|p| !p.is_spent())
            .map(|p| Body {
                id: p.id,
                tag: Tag::Bullet,
                position: p.position,
                radius: p.radius,
                ignore: p.origin,
            });

        players
            .chain(agents)
            .chain(projectiles)
            .chain(self.loose.values().cloned())
            .collect()
    }

    fn dispatch_contacts(&mut self) {
        while let Some(contact) = self.contacts.pop() {
            // Capability query: only agents expose a damage receiver.
            let damage_target = match contact.other_tag {
                Tag::Enemy => contact.other.filter(|id| self.agents.contains_key(id)),
                _ => None,
            };

            if let Some(projectile) = self.projectiles.get_mut(&contact.entity) {
                let target = ContactTarget {
                    tag: contact.other_tag,
                    damage_target,
                };
                if let Impact::Damaged(enemy) = projectile.on_contact(target, &mut self.net) {
                    debug!(projectile = %contact.entity, %enemy, "projectile impact");
                }
                continue;
            }

            let Some(agent) = self.agents.get_mut(&contact.entity) else {
                continue;
            };
            let Some(bullet) = contact.other else {
                continue;
            };
            // Controlled projectiles resolve their own contacts.
            if contact.other_tag != Tag::Bullet || self.projectiles.contains_key(&bullet) {
                continue;
            }

            let contact = BulletContact {
                tag: contact.other_tag,
                bullet,
            };
            if let BulletResolution::RemoveLocally(id) = agent.on_contact(contact, &mut self.net) {
                self.loose.remove(&id);
            }
        }
    }

    fn publish_transforms(&mut self) {
        for player in self.players.values() {
            self.net
                .publish_transform(player.id, player.position, player.yaw);
        }
        for agent in self.agents.values() {
            if !agent.destroy_issued() {
                self.net.publish_transform(agent.id, agent.position, agent.yaw);
            }
        }
        for projectile in self.projectiles.values() {
            if !projectile.is_spent() {
                let yaw = yaw_from_direction(projectile.heading);
                self.net
                    .publish_transform(projectile.id, projectile.position, yaw);
            }
        }
    }
}
