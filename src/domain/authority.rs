// Ownership/authority resolution for replicated entities.
//
// Exactly one participant holds write authority over an entity at a time. The room keeps
// the canonical table; every participant keeps a replica that it updates from ordered
// authority-change messages.

use crate::domain::entity::{EntityId, ParticipantId};
use crate::domain::errors::AuthorityError;
use std::collections::BTreeMap;

/// Whether authority over an entity may move to a participant that asks for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferPolicy {
    /// Any participant may take over (hostile agents adopted by a simulation).
    Takeover,
    /// Authority stays with the creator (players, projectiles).
    Fixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Claim {
    owner: ParticipantId,
    policy: TransferPolicy,
}

/// A granted authority transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorityChange {
    pub entity: EntityId,
    pub previous: ParticipantId,
    pub owner: ParticipantId,
}

#[derive(Debug, Clone, Default)]
pub struct AuthorityTable {
    claims: BTreeMap<EntityId, Claim>,
}

impl AuthorityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `owner` as the authority for a newly spawned entity.
    pub fn assign(&mut self, entity: EntityId, owner: ParticipantId, policy: TransferPolicy) {
        self.claims.insert(entity, Claim { owner, policy });
    }

    /// Applies an ownership change decided elsewhere, keeping the entity's policy.
    ///
    /// Returns false when the entity is unknown locally.
    pub fn set_owner(&mut self, entity: EntityId, owner: ParticipantId) -> bool {
        match self.claims.get_mut(&entity) {
            Some(claim) => {
                claim.owner = owner;
                true
            }
            None => false,
        }
    }

    pub fn owner_of(&self, entity: EntityId) -> Option<ParticipantId> {
        self.claims.get(&entity).map(|claim| claim.owner)
    }

    pub fn policy_of(&self, entity: EntityId) -> Option<TransferPolicy> {
        self.claims.get(&entity).map(|claim| claim.policy)
    }

    pub fn is_authority(&self, entity: EntityId, participant: ParticipantId) -> bool {
        self.owner_of(entity) == Some(participant)
    }

    /// Grants `requester` authority when the entity's policy allows it.
    ///
    /// Returns `Ok(None)` when the requester already owns the entity.
    pub fn request(
        &mut self,
        entity: EntityId,
        requester: ParticipantId,
    ) -> Result<Option<AuthorityChange>, AuthorityError> {
        let claim = self
            .claims
            .get_mut(&entity)
            .ok_or(AuthorityError::UnknownEntity(entity))?;

        if claim.owner == requester {
            return Ok(None);
        }
        if claim.policy == TransferPolicy::Fixed {
            return Err(AuthorityError::TransferDenied {
                entity,
                owner: claim.owner,
            });
        }

        let previous = claim.owner;
        claim.owner = requester;
        Ok(Some(AuthorityChange {
            entity,
            previous,
            owner: requester,
        }))
    }

    /// Forgets an entity after its global destroy.
    pub fn release(&mut self, entity: EntityId) -> Option<ParticipantId> {
        self.claims.remove(&entity).map(|claim| claim.owner)
    }

    /// Entities currently owned by `participant`, in id order.
    pub fn owned_by(&self, participant: ParticipantId) -> Vec<EntityId> {
        self.claims
            .iter()
            .filter(|(_, claim)| claim.owner == participant)
            .map(|(entity, _)| *entity)
            .collect()
    }

    /// Moves every `Takeover` entity owned by `from` to `to`.
    pub fn migrate(&mut self, from: ParticipantId, to: ParticipantId) -> Vec<AuthorityChange> {
        let mut changes = Vec::new();
        for (entity, claim) in self.claims.iter_mut() {
            if claim.owner == from && claim.policy == TransferPolicy::Takeover {
                claim.owner = to;
                changes.push(AuthorityChange {
                    entity: *entity,
                    previous: from,
                    owner: to,
                });
            }
        }
        changes
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}
