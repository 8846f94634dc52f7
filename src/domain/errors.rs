// Domain-level errors for replication and authority workflows.

use crate::domain::entity::{EntityId, ParticipantId};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SpawnError {
    #[error("unknown prefab `{0}`")]
    UnknownPrefab(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthorityError {
    #[error("entity {0} has no authority record")]
    UnknownEntity(EntityId),
    #[error("entity {entity} is pinned to participant {owner}")]
    TransferDenied {
        entity: EntityId,
        owner: ParticipantId,
    },
}
