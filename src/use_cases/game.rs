use super::simulation::Simulation;
use super::types::{ClientEvent, ReplicaOp, RoomCommand, WorldUpdate};
use crate::domain::Physics;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{Notify, broadcast, mpsc};
use tracing::{info, warn};

/// Drives one participant's simulation on a fixed tick until shutdown or the room goes away.
pub async fn participant_task<P: Physics + Send + 'static>(
    mut simulation: Simulation<P>,
    mut inbound: mpsc::UnboundedReceiver<ReplicaOp>,
    mut events: mpsc::Receiver<ClientEvent>,
    room_tx: mpsc::UnboundedSender<RoomCommand>,
    world_tx: broadcast::Sender<WorldUpdate>,
    tick_interval: Duration,
    shutdown: Arc<Notify>,
) {
    let participant = simulation.participant();
    let dt = tick_interval.as_secs_f32();
    let mut interval = tokio::time::interval(tick_interval);

    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                break;
            }
            _ = interval.tick() => {}
        }

        // Replica traffic first so the tick sees everything the room has ordered so far.
        loop {
            match inbound.try_recv() {
                Ok(op) => simulation.apply(op),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!(%participant, "room link closed; participant exiting");
                    return;
                }
            }
        }

        while let Ok(event) = events.try_recv() {
            simulation.handle_client(event);
        }

        simulation.step(dt);

        for outbound in simulation.flush() {
            if room_tx
                .send(RoomCommand::Submit {
                    sender: participant,
                    outbound,
                })
                .is_err()
            {
                warn!(%participant, "room closed; participant exiting");
                return;
            }
        }

        // No subscribers is fine; the client may not have attached yet.
        let _ = world_tx.send(simulation.snapshot());
    }

    info!(%participant, ticks = simulation.tick(), "participant stopped");
}
