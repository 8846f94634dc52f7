// Projectile controller: motion integration, lifetime expiry and impact resolution.
//
// Every decision here is taken only by the projectile's authority holder. Observers keep a
// passive replica whose transform is overwritten by replicated updates.

use crate::domain::damage::{IMPACT_DAMAGE, send_damage};
use crate::domain::entity::{EntityId, ParticipantId, Tag};
use crate::domain::ports::Replication;
use crate::domain::tuning::ProjectileTuning;
use glam::Vec3;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: EntityId,
    pub prefab: String,
    pub position: Vec3,
    /// Unit direction of travel.
    pub heading: Vec3,
    pub radius: f32,
    /// Entity that fired the projectile (attribution only).
    pub origin: Option<EntityId>,
    speed: f32,
    owner: Option<ParticipantId>,
    spawned_at: f32,
    life_time: f32,
    destroy_requested: bool,
}

/// What the projectile touched, resolved against the local entity registry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactTarget {
    pub tag: Tag,
    /// Damage receiver exposed by the touched entity, if any.
    pub damage_target: Option<EntityId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Not the authority holder; nothing integrated.
    Observed,
    /// Destroy already requested.
    Spent,
    Moved,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Impact {
    Observed,
    Spent,
    /// Same-side contact; the projectile keeps flying.
    Ignored,
    /// Damage was sent to the target and the projectile destroyed.
    Damaged(EntityId),
    /// Destroyed without damage.
    Destroyed,
}

impl Projectile {
    pub fn spawned(
        id: EntityId,
        prefab: impl Into<String>,
        tuning: &ProjectileTuning,
        position: Vec3,
        heading: Vec3,
        origin: Option<EntityId>,
        now: f32,
    ) -> Self {
        Self {
            id,
            prefab: prefab.into(),
            position,
            heading: heading.try_normalize().unwrap_or(Vec3::Z),
            radius: tuning.radius,
            origin,
            speed: 0.0,
            owner: None,
            spawned_at: now,
            life_time: tuning.life_time,
            destroy_requested: false,
        }
    }

    /// Sets the movement speed and the participant that fired. Must run before the first tick.
    pub fn initialize(&mut self, speed: f32, owner: ParticipantId) {
        self.speed = speed;
        self.owner = Some(owner);
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn owner(&self) -> Option<ParticipantId> {
        self.owner
    }

    pub fn is_spent(&self) -> bool {
        self.destroy_requested
    }

    pub fn is_expired(&self, now: f32) -> bool {
        now - self.spawned_at >= self.life_time
    }

    /// Expires or advances the projectile by one tick.
    pub fn tick<R: Replication>(&mut self, dt: f32, now: f32, net: &mut R) -> Step {
        if self.destroy_requested {
            return Step::Spent;
        }
        if !net.is_authority(self.id) {
            return Step::Observed;
        }
        if self.owner.is_none() {
            warn!(projectile = %self.id, "ticking uninitialized projectile");
        }

        if self.is_expired(now) {
            debug!(projectile = %self.id, "projectile expired");
            self.destroy(net);
            return Step::Expired;
        }

        self.position += self.heading * self.speed * dt;
        Step::Moved
    }

    /// Resolves a contact reported by the physics layer.
    pub fn on_contact<R: Replication>(&mut self, target: ContactTarget, net: &mut R) -> Impact {
        if self.destroy_requested {
            return Impact::Spent;
        }
        if !net.is_authority(self.id) {
            return Impact::Observed;
        }

        match target.tag {
            Tag::Player => Impact::Ignored,
            Tag::Enemy => match target.damage_target {
                Some(enemy) if enemy.is_replicated() => {
                    send_damage(net, enemy, IMPACT_DAMAGE);
                    info!(projectile = %self.id, enemy = %enemy, "hit enemy");
                    self.destroy(net);
                    Impact::Damaged(enemy)
                }
                Some(enemy) => {
                    warn!(projectile = %self.id, enemy = %enemy, "enemy has no replicated identity");
                    self.destroy(net);
                    Impact::Destroyed
                }
                None => {
                    error!(projectile = %self.id, "no damage receiver on enemy contact");
                    self.destroy(net);
                    Impact::Destroyed
                }
            },
            Tag::Wall => {
                debug!(projectile = %self.id, "hit wall");
                self.destroy(net);
                Impact::Destroyed
            }
            Tag::Obstacle => {
                debug!(projectile = %self.id, "hit obstacle");
                self.destroy(net);
                Impact::Destroyed
            }
            Tag::Bullet | Tag::Untagged => {
                self.destroy(net);
                Impact::Destroyed
            }
        }
    }

    /// Issues the global destroy once. Returns false when it was already requested.
    pub fn destroy<R: Replication>(&mut self, net: &mut R) -> bool {
        if self.destroy_requested {
            return false;
        }
        self.destroy_requested = true;
        net.destroy_replicated(self.id);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_support::RecordingReplication;

    const ID: EntityId = EntityId(1_000_001);
    const ENEMY: EntityId = EntityId(3);

    fn projectile() -> Projectile {
        let tuning = ProjectileTuning {
            speed: 20.0,
            life_time: 1.0,
            radius: 0.1,
        };
        let mut projectile =
            Projectile::spawned(ID, "Bullet", &tuning, Vec3::ZERO, Vec3::Z, None, 0.0);
        projectile.initialize(tuning.speed, ParticipantId(1));
        projectile
    }

    fn authority() -> RecordingReplication {
        RecordingReplication::new(ParticipantId(1)).owning(ID)
    }

    fn enemy(damage_target: Option<EntityId>) -> ContactTarget {
        ContactTarget {
            tag: Tag::Enemy,
            damage_target,
        }
    }

    #[test]
    fn when_authority_ticks_then_position_advances_by_speed_times_dt() {
        let mut projectile = projectile();
        let mut net = authority();

        assert_eq!(projectile.tick(0.1, 0.1, &mut net), Step::Moved);
        assert_eq!(projectile.tick(0.25, 0.35, &mut net), Step::Moved);

        assert!((projectile.position - Vec3::new(0.0, 0.0, 7.0)).length() < 1e-5);
    }

    #[test]
    fn when_observer_ticks_then_projectile_does_not_move() {
        let mut projectile = projectile();
        let mut net = RecordingReplication::new(ParticipantId(2));

        assert_eq!(projectile.tick(0.1, 0.1, &mut net), Step::Observed);

        assert_eq!(projectile.position, Vec3::ZERO);
        assert!(net.calls.is_empty());
    }

    #[test]
    fn when_life_time_elapses_then_projectile_is_destroyed_once() {
        let mut projectile = projectile();
        let mut net = authority();

        assert_eq!(projectile.tick(0.5, 0.5, &mut net), Step::Moved);
        assert_eq!(projectile.tick(0.5, 1.0, &mut net), Step::Expired);
        assert_eq!(projectile.tick(0.5, 1.5, &mut net), Step::Spent);

        assert_eq!(net.destroys(), vec![ID]);
    }

    #[test]
    fn when_contact_is_player_then_nothing_happens() {
        let mut projectile = projectile();
        let mut net = authority();

        let impact = projectile.on_contact(
            ContactTarget {
                tag: Tag::Player,
                damage_target: None,
            },
            &mut net,
        );

        assert_eq!(impact, Impact::Ignored);
        assert!(net.calls.is_empty());
        assert!(!projectile.is_spent());
    }

    #[test]
    fn when_contact_is_enemy_then_one_damage_call_precedes_destroy() {
        let mut projectile = projectile();
        let mut net = authority();

        let impact = projectile.on_contact(enemy(Some(ENEMY)), &mut net);

        assert_eq!(impact, Impact::Damaged(ENEMY));
        assert_eq!(net.damage_calls(), vec![(ENEMY, 10.0)]);
        assert_eq!(net.destroys(), vec![ID]);
        assert_eq!(net.calls.len(), 2);
        assert!(matches!(
            net.calls[0],
            crate::domain::test_support::RecordedCall::Invoke { .. }
        ));
    }

    #[test]
    fn when_enemy_has_no_damage_receiver_then_projectile_is_still_destroyed() {
        let mut projectile = projectile();
        let mut net = authority();

        let impact = projectile.on_contact(enemy(None), &mut net);

        assert_eq!(impact, Impact::Destroyed);
        assert!(net.damage_calls().is_empty());
        assert_eq!(net.destroys(), vec![ID]);
    }

    #[test]
    fn when_enemy_identity_is_invalid_then_damage_is_skipped_and_projectile_destroyed() {
        let mut projectile = projectile();
        let mut net = authority();

        let impact = projectile.on_contact(enemy(Some(EntityId::INVALID)), &mut net);

        assert_eq!(impact, Impact::Destroyed);
        assert!(net.damage_calls().is_empty());
        assert_eq!(net.destroys(), vec![ID]);
    }

    #[test]
    fn when_contact_is_wall_obstacle_or_untagged_then_projectile_is_destroyed() {
        for tag in [Tag::Wall, Tag::Obstacle, Tag::Untagged, Tag::Bullet] {
            let mut projectile = projectile();
            let mut net = authority();

            let impact = projectile.on_contact(
                ContactTarget {
                    tag,
                    damage_target: None,
                },
                &mut net,
            );

            assert_eq!(impact, Impact::Destroyed, "tag {tag:?}");
            assert_eq!(net.destroys(), vec![ID]);
        }
    }

    #[test]
    fn when_second_contact_follows_destroy_then_it_is_ignored() {
        let mut projectile = projectile();
        let mut net = authority();

        projectile.on_contact(enemy(Some(ENEMY)), &mut net);
        let second = projectile.on_contact(enemy(Some(ENEMY)), &mut net);

        assert_eq!(second, Impact::Spent);
        assert_eq!(net.damage_calls().len(), 1);
        assert_eq!(net.destroys().len(), 1);
    }

    #[test]
    fn when_observer_sees_contact_then_it_neither_damages_nor_destroys() {
        let mut projectile = projectile();
        let mut net = RecordingReplication::new(ParticipantId(2));

        let impact = projectile.on_contact(enemy(Some(ENEMY)), &mut net);

        assert_eq!(impact, Impact::Observed);
        assert!(net.calls.is_empty());
    }
}
