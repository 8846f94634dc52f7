// Damage propagation: remote invocations that every participant applies in order.
//
// The sender addresses all participants (itself included). Health therefore converges
// on every replica, while only the authority holder acts on the outcome.

use crate::domain::entity::{EntityId, ParticipantId};
use crate::domain::ports::Replication;

/// Fixed damage dealt by a bullet impact.
pub const IMPACT_DAMAGE: f32 = 10.0;

/// Procedures that may be invoked on a remote entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RemoteCall {
    TakeDamage { amount: f32 },
}

impl RemoteCall {
    pub fn procedure(&self) -> &'static str {
        match self {
            RemoteCall::TakeDamage { .. } => "TakeDamage",
        }
    }
}

/// Which participants receive an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcTarget {
    /// Every participant, including the sender.
    All,
    /// Every participant except the sender.
    Others,
}

impl RpcTarget {
    pub fn includes(&self, sender: ParticipantId, recipient: ParticipantId) -> bool {
        match self {
            RpcTarget::All => true,
            RpcTarget::Others => sender != recipient,
        }
    }
}

/// An invocation in flight through the transport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Invocation {
    pub entity: EntityId,
    pub call: RemoteCall,
    pub target: RpcTarget,
    pub sender: ParticipantId,
}

/// Receiver side of the protocol.
pub trait Damageable {
    fn take_damage<R: Replication>(&mut self, amount: f32, net: &mut R) -> DamageOutcome;
}

/// Result of applying one damage delta on the local replica.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageOutcome {
    pub health: f32,
    /// True when this call issued the global destroy.
    pub destroyed: bool,
}

/// Addresses `TakeDamage(amount)` on `entity` to all participants.
pub fn send_damage<R: Replication>(net: &mut R, entity: EntityId, amount: f32) {
    net.invoke_remote(entity, RemoteCall::TakeDamage { amount }, RpcTarget::All);
}

/// Applies a delivered invocation to the addressed receiver.
pub fn deliver<T: Damageable, R: Replication>(
    receiver: &mut T,
    call: RemoteCall,
    net: &mut R,
) -> DamageOutcome {
    match call {
        RemoteCall::TakeDamage { amount } => receiver.take_damage(amount, net),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_support::{RecordedCall, RecordingReplication};

    #[test]
    fn when_damage_is_sent_then_it_targets_all_participants() {
        let mut net = RecordingReplication::new(ParticipantId(1));

        send_damage(&mut net, EntityId(5), IMPACT_DAMAGE);

        assert_eq!(
            net.calls,
            vec![RecordedCall::Invoke {
                entity: EntityId(5),
                call: RemoteCall::TakeDamage { amount: 10.0 },
                target: RpcTarget::All,
            }]
        );
    }

    #[test]
    fn when_target_is_others_then_sender_is_excluded() {
        assert!(RpcTarget::All.includes(ParticipantId(1), ParticipantId(1)));
        assert!(!RpcTarget::Others.includes(ParticipantId(1), ParticipantId(1)));
        assert!(RpcTarget::Others.includes(ParticipantId(1), ParticipantId(2)));
    }

    #[test]
    fn when_procedure_is_named_then_it_matches_wire_name() {
        assert_eq!(
            RemoteCall::TakeDamage { amount: 1.0 }.procedure(),
            "TakeDamage"
        );
    }
}
