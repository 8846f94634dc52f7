// Domain layer: combat rules, authority arbitration and the ports they depend on.

pub mod agent;
pub mod authority;
pub mod contact;
pub mod damage;
pub mod entity;
pub mod errors;
pub mod player;
pub mod ports;
pub mod projectile;
pub mod state;
pub mod systems;
pub mod tuning;

#[cfg(test)]
pub(crate) mod test_support;

pub use agent::{AgentState, AgentTick, BulletContact, BulletResolution, HostileAgent, Shot};
pub use authority::{AuthorityChange, AuthorityTable, TransferPolicy};
pub use contact::{Body, Contact, ContactQueue};
pub use damage::{DamageOutcome, Damageable, IMPACT_DAMAGE, Invocation, RemoteCall, RpcTarget};
pub use entity::{EntityId, ParticipantId, Tag};
pub use errors::{AuthorityError, SpawnError};
pub use player::Player;
pub use ports::{ContactSource, Physics, Replication, WorldQuery};
pub use projectile::{ContactTarget, Impact, Projectile, Step};
pub use state::{AgentSnapshot, PlayerSnapshot, ProjectileSnapshot};
pub use systems::ArenaPhysics;
pub use tuning::Tuning;
