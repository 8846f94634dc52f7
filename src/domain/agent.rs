// Hostile agent controller: targeting, aim tracking, fire gating, patrol and health.
//
// Motion, firing and destruction are decided only by the agent's authority holder. Damage
// is applied on every participant so displayed health converges everywhere.

use crate::domain::damage::{DamageOutcome, Damageable, IMPACT_DAMAGE, send_damage};
use crate::domain::entity::{EntityId, Tag, forward_from_yaw, wrap_angle, yaw_from_direction};
use crate::domain::player::Player;
use crate::domain::ports::{Replication, WorldQuery};
use crate::domain::tuning::{AgentTuning, PatrolMode};
use glam::{Quat, Vec3};
use std::f32::consts::PI;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Idle,
    Patrolling,
    Tracking,
    Firing,
}

/// Non-owning reference to the player selected this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetRef {
    pub player: EntityId,
    pub position: Vec3,
    pub distance: f32,
}

/// A projectile requested by the agent this tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Shot {
    pub projectile: EntityId,
    pub prefab: String,
    pub position: Vec3,
    pub heading: Vec3,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentTick {
    pub state: AgentState,
    pub shot: Option<Shot>,
}

/// A bullet-tagged body touching the agent without a projectile controller of its own.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BulletContact {
    pub tag: Tag,
    pub bullet: EntityId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulletResolution {
    Ignored,
    /// Damage sent; the bullet was destroyed globally.
    DestroyedGlobally,
    /// Damage sent; the bullet has no replicated identity and must be removed locally.
    RemoveLocally(EntityId),
}

#[derive(Debug, Clone)]
pub struct HostileAgent {
    pub id: EntityId,
    pub position: Vec3,
    pub yaw: f32,
    health: f32,
    tuning: AgentTuning,
    next_fire_time: f32,
    target: Option<TargetRef>,
    state: AgentState,
    patrol_origin: Vec3,
    patrol_direction: f32,
    destroy_issued: bool,
}

impl HostileAgent {
    pub fn new(id: EntityId, position: Vec3, yaw: f32, tuning: AgentTuning) -> Self {
        Self {
            id,
            position,
            yaw: wrap_angle(yaw),
            health: tuning.max_health,
            tuning,
            next_fire_time: 0.0,
            target: None,
            state: AgentState::Idle,
            patrol_origin: position,
            patrol_direction: 1.0,
            destroy_issued: false,
        }
    }

    /// Restores replicated health for a late-joining replica.
    pub fn with_health(mut self, health: f32) -> Self {
        self.health = health;
        self
    }

    /// Adopts the agent: a participant that is not yet its authority asks for it.
    pub fn on_spawn<R: Replication>(&mut self, net: &mut R) {
        if !net.is_authority(self.id) {
            debug!(agent = %self.id, "requesting agent authority");
            net.request_authority(self.id);
        }
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    pub fn max_health(&self) -> f32 {
        self.tuning.max_health
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    pub fn destroy_issued(&self) -> bool {
        self.destroy_issued
    }

    pub fn next_fire_time(&self) -> f32 {
        self.next_fire_time
    }

    pub fn target(&self) -> Option<TargetRef> {
        self.target
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    pub fn radius(&self) -> f32 {
        self.tuning.radius
    }

    pub fn forward(&self) -> Vec3 {
        forward_from_yaw(self.yaw)
    }

    /// Runs one simulation tick. Observers return immediately.
    pub fn tick<R: Replication, W: WorldQuery>(
        &mut self,
        dt: f32,
        now: f32,
        roster: &[Player],
        world: &W,
        net: &mut R,
    ) -> AgentTick {
        if self.destroy_issued || !net.is_authority(self.id) {
            return AgentTick {
                state: self.state,
                shot: None,
            };
        }
        // Authority may arrive after health already dropped (migration).
        if !self.is_alive() {
            self.destroy(net);
            return AgentTick {
                state: self.state,
                shot: None,
            };
        }

        self.target = self.acquire_target(roster);
        let Some(target) = self.target else {
            self.state = if self.patrol(dt, world) {
                AgentState::Patrolling
            } else {
                AgentState::Idle
            };
            return AgentTick {
                state: self.state,
                shot: None,
            };
        };

        self.aim(target.position, dt);
        self.state = AgentState::Tracking;

        let mut shot = None;
        if self.can_fire(&target, now) {
            shot = self.fire(&target, now, net);
            if shot.is_some() {
                self.state = AgentState::Firing;
            }
        }

        AgentTick {
            state: self.state,
            shot,
        }
    }

    /// Nearest player within detection range; the first of equally near players wins.
    pub fn acquire_target(&self, roster: &[Player]) -> Option<TargetRef> {
        let mut best: Option<TargetRef> = None;
        for player in roster {
            let distance = self.position.distance(player.position);
            if distance > self.tuning.detection_range {
                continue;
            }
            if best.is_none_or(|current| distance < current.distance) {
                best = Some(TargetRef {
                    player: player.id,
                    position: player.position,
                    distance,
                });
            }
        }
        best
    }

    // Turns toward the target on the horizontal plane at the bounded turn rate.
    fn aim(&mut self, target: Vec3, dt: f32) {
        let flat = Vec3::new(target.x, self.position.y, target.z) - self.position;
        let Some(direction) = flat.try_normalize() else {
            return;
        };

        let delta = wrap_angle(yaw_from_direction(direction) - self.yaw);
        let max_step = self.tuning.turn_rate_degrees.to_radians() * dt;
        self.yaw = wrap_angle(self.yaw + delta.clamp(-max_step, max_step));
    }

    fn can_fire(&self, target: &TargetRef, now: f32) -> bool {
        if target.distance > self.tuning.detection_range || now < self.next_fire_time {
            return false;
        }
        match self.tuning.alignment_threshold {
            Some(threshold) => {
                let to_target = (target.position - self.position).normalize_or_zero();
                self.forward().dot(to_target) > threshold
            }
            None => true,
        }
    }

    fn fire<R: Replication>(&mut self, target: &TargetRef, now: f32, net: &mut R) -> Option<Shot> {
        let (Some(prefab), Some(fire_point)) = (
            self.tuning.projectile_prefab.as_deref(),
            self.tuning.fire_point,
        ) else {
            return None;
        };

        let muzzle = self.position + Quat::from_rotation_y(self.yaw) * fire_point;
        let heading = (target.position - muzzle)
            .try_normalize()
            .unwrap_or_else(|| self.forward());

        match net.spawn_replicated(prefab, muzzle, heading, Some(self.id)) {
            Ok(projectile) => {
                self.next_fire_time = now + self.tuning.fire_rate;
                debug!(agent = %self.id, %projectile, target = %target.player, "agent fired");
                Some(Shot {
                    projectile,
                    prefab: prefab.to_string(),
                    position: muzzle,
                    heading,
                })
            }
            Err(e) => {
                warn!(agent = %self.id, error = %e, "failed to spawn projectile");
                None
            }
        }
    }

    // Moves along the patrol axis; returns false when the agent stayed put.
    fn patrol<W: WorldQuery>(&mut self, dt: f32, world: &W) -> bool {
        let patrol = self.tuning.patrol;
        match patrol.mode {
            PatrolMode::Static | PatrolMode::Square => false,
            PatrolMode::LeftRight => {
                let axis = Vec3::X * self.patrol_direction;
                let destination = self.position + axis * patrol.speed * dt;

                let in_range = (destination.x - self.patrol_origin.x).abs() <= patrol.distance;
                let grounded = world.has_ground_below(destination, patrol.ground_probe);
                let clear = !world.is_obstructed(self.position, axis, patrol.obstacle_probe);

                if in_range && grounded && clear {
                    self.position = destination;
                    true
                } else {
                    self.patrol_direction = -self.patrol_direction;
                    self.yaw = wrap_angle(self.yaw + PI);
                    false
                }
            }
        }
    }

    /// Resolves a bullet body touching the agent. Only the authority acts.
    pub fn on_contact<R: Replication>(
        &mut self,
        contact: BulletContact,
        net: &mut R,
    ) -> BulletResolution {
        if contact.tag != Tag::Bullet || !net.is_authority(self.id) {
            return BulletResolution::Ignored;
        }

        debug!(agent = %self.id, bullet = %contact.bullet, "bullet hit agent");
        send_damage(net, self.id, IMPACT_DAMAGE);

        if contact.bullet.is_replicated() {
            net.destroy_replicated(contact.bullet);
            BulletResolution::DestroyedGlobally
        } else {
            BulletResolution::RemoveLocally(contact.bullet)
        }
    }

    fn destroy<R: Replication>(&mut self, net: &mut R) -> bool {
        if self.destroy_issued {
            return false;
        }
        self.destroy_issued = true;
        info!(agent = %self.id, health = self.health, "agent destroyed");
        net.destroy_replicated(self.id);
        true
    }
}

impl Damageable for HostileAgent {
    fn take_damage<R: Replication>(&mut self, amount: f32, net: &mut R) -> DamageOutcome {
        self.health -= amount;
        info!(agent = %self.id, damage = amount, health = self.health, "agent took damage");

        let destroyed = self.health <= 0.0 && net.is_authority(self.id) && self.destroy(net);
        DamageOutcome {
            health: self.health,
            destroyed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::damage::deliver;
    use crate::domain::entity::ParticipantId;
    use crate::domain::test_support::{FlatWorld, RecordedCall, RecordingReplication};
    use crate::domain::tuning::PatrolTuning;

    const AGENT: EntityId = EntityId(11);

    fn player(id: u64, position: Vec3) -> Player {
        Player {
            id: EntityId(id),
            owner: ParticipantId(id),
            display_name: format!("p{id}"),
            position,
            yaw: 0.0,
            radius: 0.5,
        }
    }

    fn agent() -> HostileAgent {
        // Facing +Z so players on the +Z axis are aligned.
        HostileAgent::new(AGENT, Vec3::ZERO, 0.0, AgentTuning::default())
    }

    fn authority() -> RecordingReplication {
        RecordingReplication::new(ParticipantId(1)).owning(AGENT)
    }

    fn observer() -> RecordingReplication {
        RecordingReplication::new(ParticipantId(2))
    }

    fn patrolling(mode: PatrolMode) -> HostileAgent {
        let tuning = AgentTuning {
            patrol: PatrolTuning {
                mode,
                speed: 2.0,
                distance: 5.0,
                ..PatrolTuning::default()
            },
            ..AgentTuning::default()
        };
        HostileAgent::new(AGENT, Vec3::ZERO, PI / 2.0, tuning)
    }

    #[test]
    fn when_players_are_in_range_then_nearest_is_targeted() {
        let agent = agent();
        let roster = vec![
            player(1, Vec3::new(0.0, 0.0, 8.0)),
            player(2, Vec3::new(3.0, 0.0, 0.0)),
            player(3, Vec3::new(0.0, 0.0, 30.0)),
        ];

        let target = agent.acquire_target(&roster).expect("target expected");

        assert_eq!(target.player, EntityId(2));
        assert!((target.distance - 3.0).abs() < 1e-5);
    }

    #[test]
    fn when_players_are_equally_near_then_first_in_roster_wins() {
        let agent = agent();
        let roster = vec![
            player(1, Vec3::new(4.0, 0.0, 0.0)),
            player(2, Vec3::new(-4.0, 0.0, 0.0)),
        ];

        let target = agent.acquire_target(&roster).expect("target expected");

        assert_eq!(target.player, EntityId(1));
    }

    #[test]
    fn when_player_is_beyond_detection_range_then_no_target() {
        let agent = agent();
        let roster = vec![player(1, Vec3::new(0.0, 0.0, 10.5))];

        assert_eq!(agent.acquire_target(&roster), None);
    }

    #[test]
    fn when_aligned_target_enters_range_then_agent_fires_and_waits_fire_rate() {
        let mut agent = agent();
        let mut net = authority();
        let roster = vec![player(1, Vec3::new(0.0, 0.0, 5.0))];

        let first = agent.tick(0.016, 0.0, &roster, &FlatWorld::open(), &mut net);
        assert_eq!(first.state, AgentState::Firing);
        assert!(first.shot.is_some());
        assert_eq!(agent.next_fire_time(), 1.0);

        let blocked = agent.tick(0.016, 0.5, &roster, &FlatWorld::open(), &mut net);
        assert_eq!(blocked.state, AgentState::Tracking);
        assert!(blocked.shot.is_none());

        let second = agent.tick(0.016, 1.0, &roster, &FlatWorld::open(), &mut net);
        assert!(second.shot.is_some());
        assert_eq!(agent.next_fire_time(), 2.0);
        assert_eq!(net.spawns(), 2);
    }

    #[test]
    fn when_shot_is_fired_then_projectile_is_aimed_at_target_from_muzzle() {
        let mut agent = agent();
        let mut net = authority();
        let roster = vec![player(1, Vec3::new(0.0, 0.5, 6.0))];

        let shot = agent
            .tick(0.016, 0.0, &roster, &FlatWorld::open(), &mut net)
            .shot
            .expect("shot expected");

        assert!((shot.position - Vec3::new(0.0, 0.5, 0.8)).length() < 1e-5);
        assert!((shot.heading - Vec3::Z).length() < 1e-5);
        assert_eq!(shot.prefab, "EnemyProjectile");
        assert!(matches!(
            net.calls[0],
            RecordedCall::Spawn { origin: Some(AGENT), .. }
        ));
    }

    #[test]
    fn when_target_is_behind_then_agent_turns_but_does_not_fire() {
        let mut agent = agent();
        let mut net = authority();
        let roster = vec![player(1, Vec3::new(0.0, 0.0, -5.0))];

        let tick = agent.tick(0.1, 0.0, &roster, &FlatWorld::open(), &mut net);

        assert_eq!(tick.state, AgentState::Tracking);
        assert!(tick.shot.is_none());
        // 120 deg/s for 0.1 s.
        assert!((agent.yaw.abs() - 12.0_f32.to_radians()).abs() < 1e-4);
        assert_eq!(agent.next_fire_time(), 0.0);
    }

    #[test]
    fn when_alignment_check_is_disabled_then_agent_fires_regardless_of_facing() {
        let tuning = AgentTuning {
            alignment_threshold: None,
            ..AgentTuning::default()
        };
        let mut agent = HostileAgent::new(AGENT, Vec3::ZERO, 0.0, tuning);
        let mut net = authority();
        let roster = vec![player(1, Vec3::new(0.0, 0.0, -5.0))];

        let tick = agent.tick(0.016, 0.0, &roster, &FlatWorld::open(), &mut net);

        assert!(tick.shot.is_some());
    }

    #[test]
    fn when_aiming_then_vertical_offset_is_ignored() {
        let mut agent = agent();
        let mut net = authority();
        let roster = vec![player(1, Vec3::new(5.0, 4.0, 0.0))];

        agent.tick(10.0, 0.0, &roster, &FlatWorld::open(), &mut net);

        assert!((agent.yaw - PI / 2.0).abs() < 1e-4);
    }

    #[test]
    fn when_spawn_fails_then_shot_is_skipped_and_fire_time_unchanged() {
        let mut agent = agent();
        let mut net = authority();
        net.prefabs.clear();
        let roster = vec![player(1, Vec3::new(0.0, 0.0, 5.0))];

        let tick = agent.tick(0.016, 0.0, &roster, &FlatWorld::open(), &mut net);

        assert!(tick.shot.is_none());
        assert_eq!(tick.state, AgentState::Tracking);
        assert_eq!(agent.next_fire_time(), 0.0);
    }

    #[test]
    fn when_fire_point_is_missing_then_agent_never_fires() {
        let tuning = AgentTuning {
            fire_point: None,
            ..AgentTuning::default()
        };
        let mut agent = HostileAgent::new(AGENT, Vec3::ZERO, 0.0, tuning);
        let mut net = authority();
        let roster = vec![player(1, Vec3::new(0.0, 0.0, 5.0))];

        let tick = agent.tick(0.016, 0.0, &roster, &FlatWorld::open(), &mut net);

        assert!(tick.shot.is_none());
        assert!(net.calls.is_empty());
    }

    #[test]
    fn when_observer_ticks_then_agent_neither_moves_nor_fires() {
        let mut agent = agent();
        let mut net = observer();
        let roster = vec![player(1, Vec3::new(3.0, 0.0, 3.0))];

        let tick = agent.tick(0.5, 0.0, &roster, &FlatWorld::open(), &mut net);

        assert_eq!(tick.state, AgentState::Idle);
        assert!(tick.shot.is_none());
        assert_eq!(agent.yaw, 0.0);
        assert!(net.calls.is_empty());
    }

    #[test]
    fn when_not_authority_on_spawn_then_authority_is_requested() {
        let mut agent = agent();
        let mut net = observer();

        agent.on_spawn(&mut net);

        assert_eq!(
            net.calls,
            vec![RecordedCall::RequestAuthority { entity: AGENT }]
        );
    }

    #[test]
    fn when_already_authority_on_spawn_then_nothing_is_requested() {
        let mut agent = agent();
        let mut net = authority();

        agent.on_spawn(&mut net);

        assert!(net.calls.is_empty());
    }

    #[test]
    fn when_damaged_on_every_participant_then_health_converges() {
        let mut on_authority = agent();
        let mut on_observer = agent();
        let mut authority_net = authority();
        let mut observer_net = observer();

        for _ in 0..3 {
            deliver(
                &mut on_authority,
                crate::domain::damage::RemoteCall::TakeDamage { amount: 10.0 },
                &mut authority_net,
            );
            deliver(
                &mut on_observer,
                crate::domain::damage::RemoteCall::TakeDamage { amount: 10.0 },
                &mut observer_net,
            );
        }

        assert_eq!(on_authority.health(), 70.0);
        assert_eq!(on_observer.health(), 70.0);
        assert!(authority_net.destroys().is_empty());
    }

    #[test]
    fn when_health_reaches_zero_then_only_authority_destroys_once() {
        let mut on_authority = agent();
        let mut on_observer = agent();
        let mut authority_net = authority();
        let mut observer_net = observer();

        for _ in 0..10 {
            on_authority.take_damage(10.0, &mut authority_net);
            on_observer.take_damage(10.0, &mut observer_net);
        }
        let extra = on_authority.take_damage(10.0, &mut authority_net);

        assert_eq!(on_observer.health(), 0.0);
        assert!(observer_net.destroys().is_empty());
        assert_eq!(authority_net.destroys(), vec![AGENT]);
        assert!(!extra.destroyed);
        // Health is never clamped.
        assert_eq!(extra.health, -10.0);
    }

    #[test]
    fn when_authority_arrives_after_death_then_destroy_is_issued_on_tick() {
        let mut agent = agent();
        let mut net = observer();
        agent.take_damage(150.0, &mut net);
        assert!(net.destroys().is_empty());

        net.owned.insert(AGENT);
        agent.tick(0.016, 0.0, &[], &FlatWorld::open(), &mut net);
        agent.tick(0.016, 0.016, &[], &FlatWorld::open(), &mut net);

        assert_eq!(net.destroys(), vec![AGENT]);
    }

    #[test]
    fn when_bullet_touches_authority_agent_then_damage_is_sent_and_bullet_destroyed() {
        let mut agent = agent();
        let mut net = authority();
        let bullet = EntityId(2_000_004);

        let resolution = agent.on_contact(
            BulletContact {
                tag: Tag::Bullet,
                bullet,
            },
            &mut net,
        );

        assert_eq!(resolution, BulletResolution::DestroyedGlobally);
        assert_eq!(net.damage_calls(), vec![(AGENT, 10.0)]);
        assert_eq!(net.destroys(), vec![bullet]);
    }

    #[test]
    fn when_bullet_has_no_identity_then_it_is_removed_locally() {
        let mut agent = agent();
        let mut net = authority();
        let bullet = EntityId::local(1);

        let resolution = agent.on_contact(
            BulletContact {
                tag: Tag::Bullet,
                bullet,
            },
            &mut net,
        );

        assert_eq!(resolution, BulletResolution::RemoveLocally(bullet));
        assert_eq!(net.damage_calls().len(), 1);
        assert!(net.destroys().is_empty());
    }

    #[test]
    fn when_observer_agent_is_touched_then_contact_is_ignored() {
        let mut agent = agent();
        let mut net = observer();

        let resolution = agent.on_contact(
            BulletContact {
                tag: Tag::Bullet,
                bullet: EntityId(2_000_004),
            },
            &mut net,
        );

        assert_eq!(resolution, BulletResolution::Ignored);
        assert!(net.calls.is_empty());
    }

    #[test]
    fn when_patrol_path_is_clear_then_agent_moves_along_axis() {
        let mut agent = patrolling(PatrolMode::LeftRight);
        let mut net = authority();

        let tick = agent.tick(0.5, 0.0, &[], &FlatWorld::open(), &mut net);

        assert_eq!(tick.state, AgentState::Patrolling);
        assert!((agent.position - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn when_ground_probe_fails_then_direction_flips_without_moving() {
        let mut agent = patrolling(PatrolMode::LeftRight);
        let mut net = authority();
        let world = FlatWorld {
            ground: false,
            blocked: false,
        };

        let tick = agent.tick(0.5, 0.0, &[], &world, &mut net);

        assert_eq!(tick.state, AgentState::Idle);
        assert_eq!(agent.position, Vec3::ZERO);
        assert!((agent.yaw - (-PI / 2.0)).abs() < 1e-4);

        // The next clear tick moves the other way.
        agent.tick(0.5, 0.5, &[], &FlatWorld::open(), &mut net);
        assert!((agent.position - Vec3::new(-1.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn when_obstacle_is_ahead_then_direction_flips_without_moving() {
        let mut agent = patrolling(PatrolMode::LeftRight);
        let mut net = authority();
        let world = FlatWorld {
            ground: true,
            blocked: true,
        };

        agent.tick(0.5, 0.0, &[], &world, &mut net);

        assert_eq!(agent.position, Vec3::ZERO);
    }

    #[test]
    fn when_patrol_reaches_distance_then_agent_bounces_back() {
        let mut agent = patrolling(PatrolMode::LeftRight);
        let mut net = authority();
        let world = FlatWorld::open();

        // 2 units/s for 1 s steps: 2, 4, then 6 would exceed 5.
        agent.tick(1.0, 0.0, &[], &world, &mut net);
        agent.tick(1.0, 1.0, &[], &world, &mut net);
        let blocked = agent.tick(1.0, 2.0, &[], &world, &mut net);
        agent.tick(1.0, 3.0, &[], &world, &mut net);

        assert_eq!(blocked.state, AgentState::Idle);
        assert!((agent.position.x - 2.0).abs() < 1e-5);
    }

    #[test]
    fn when_patrol_mode_is_square_then_agent_stays_static() {
        let mut agent = patrolling(PatrolMode::Square);
        let mut net = authority();

        let tick = agent.tick(1.0, 0.0, &[], &FlatWorld::open(), &mut net);

        assert_eq!(tick.state, AgentState::Idle);
        assert_eq!(agent.position, Vec3::ZERO);
    }
}
