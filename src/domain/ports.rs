// Ports for the collaborators the combat core depends on.

use crate::domain::contact::{Body, ContactQueue};
use crate::domain::damage::{RemoteCall, RpcTarget};
use crate::domain::entity::{EntityId, ParticipantId};
use crate::domain::errors::SpawnError;
use glam::Vec3;

/// Transport/replication layer as seen from one participant.
pub trait Replication {
    fn local_participant(&self) -> ParticipantId;

    /// Spawns a replicated entity by prefab name. The caller becomes its authority.
    fn spawn_replicated(
        &mut self,
        prefab: &str,
        position: Vec3,
        heading: Vec3,
        origin: Option<EntityId>,
    ) -> Result<EntityId, SpawnError>;

    /// Removes an entity from every participant's view.
    fn destroy_replicated(&mut self, entity: EntityId);

    fn invoke_remote(&mut self, entity: EntityId, call: RemoteCall, target: RpcTarget);

    fn is_authority(&self, entity: EntityId) -> bool;

    fn request_authority(&mut self, entity: EntityId);
}

/// Point and ray queries against static level geometry.
pub trait WorldQuery {
    /// True when a downward probe from `point` hits ground within `max_distance`.
    fn has_ground_below(&self, point: Vec3, max_distance: f32) -> bool;

    /// True when a ray from `origin` along `direction` hits geometry within `max_distance`.
    fn is_obstructed(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> bool;
}

/// Physics step that reports newly started contacts.
pub trait ContactSource {
    fn collect_contacts(&mut self, bodies: &[Body], queue: &mut ContactQueue);
}

/// Everything the simulation needs from the physics host.
pub trait Physics: WorldQuery + ContactSource {}

impl<T: WorldQuery + ContactSource> Physics for T {}
