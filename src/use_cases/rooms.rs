// Room orchestration: creating rooms, admitting participants and spawning their tasks.

use crate::domain::player::avatar_id;
use crate::domain::{ArenaPhysics, EntityId, ParticipantId, Tuning};
use crate::use_cases::game::participant_task;
use crate::use_cases::room::{RoomState, room_task};
use crate::use_cases::simulation::Simulation;
use crate::use_cases::{ClientEvent, ReplicaOp, RoomCommand, WorldUpdate};
use axum::extract::ws::Utf8Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Notify, RwLock, broadcast, mpsc, watch};
use tracing::info;

/// Shared configuration for spawning rooms.
#[derive(Debug, Clone)]
pub struct RoomSettings {
    /// Capacity for inbound client events per participant.
    pub event_channel_capacity: usize,
    /// Capacity for broadcast world updates per participant.
    pub world_broadcast_capacity: usize,
    /// Fixed tick interval for participant simulations.
    pub tick_interval: Duration,
    pub tuning: Arc<Tuning>,
}

/// Errors returned by room registry operations.
#[derive(Debug)]
pub enum RoomError {
    /// Room already exists and cannot be re-created.
    AlreadyExists,
    /// The room task has shut down.
    Closed,
}

/// Per-room command channel and participant allocation.
#[derive(Clone)]
pub struct RoomHandle {
    /// Identifier clients use to target this room.
    pub room_id: Arc<str>,
    commands: mpsc::UnboundedSender<RoomCommand>,
    next_participant: Arc<AtomicU64>,
    settings: RoomSettings,
}

/// Channels owned by one connected participant.
pub struct ParticipantHandle {
    pub participant: ParticipantId,
    pub player_id: EntityId,
    /// Sender for client input into the participant simulation.
    pub events_tx: mpsc::Sender<ClientEvent>,
    /// Broadcast sender for raw world updates.
    pub world_tx: broadcast::Sender<WorldUpdate>,
    /// Broadcast sender for serialized world updates.
    pub world_bytes_tx: broadcast::Sender<Utf8Bytes>,
    /// Watch sender holding the latest serialized world update.
    pub world_latest_tx: watch::Sender<Utf8Bytes>,
    commands: mpsc::UnboundedSender<RoomCommand>,
    shutdown: Arc<Notify>,
}

impl RoomHandle {
    /// Admits a new participant and spawns its simulation task.
    pub fn join(&self, display_name: String) -> Result<ParticipantHandle, RoomError> {
        let participant = ParticipantId(self.next_participant.fetch_add(1, Ordering::Relaxed));
        let settings = &self.settings;

        let (link_tx, link_rx) = mpsc::unbounded_channel::<ReplicaOp>();
        let (events_tx, events_rx) = mpsc::channel::<ClientEvent>(settings.event_channel_capacity);
        let (world_tx, _world_rx) =
            broadcast::channel::<WorldUpdate>(settings.world_broadcast_capacity);
        let (world_bytes_tx, _world_bytes_rx) =
            broadcast::channel::<Utf8Bytes>(settings.world_broadcast_capacity);
        let (world_latest_tx, _world_latest_rx) = watch::channel::<Utf8Bytes>(Utf8Bytes::from(""));
        let shutdown = Arc::new(Notify::new());

        self.commands
            .send(RoomCommand::Join {
                participant,
                display_name,
                link: link_tx,
            })
            .map_err(|_| RoomError::Closed)?;

        let physics = ArenaPhysics::new(settings.tuning.arena.clone());
        let simulation = Simulation::new(participant, settings.tuning.clone(), physics);
        tokio::spawn(participant_task(
            simulation,
            link_rx,
            events_rx,
            self.commands.clone(),
            world_tx.clone(),
            settings.tick_interval,
            shutdown.clone(),
        ));

        info!(room_id = %self.room_id, %participant, "participant admitted");
        Ok(ParticipantHandle {
            participant,
            player_id: avatar_id(participant),
            events_tx,
            world_tx,
            world_bytes_tx,
            world_latest_tx,
            commands: self.commands.clone(),
            shutdown,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }
}

impl ParticipantHandle {
    /// Stops the simulation and tells the room the participant is gone.
    pub fn leave(&self) {
        self.shutdown.notify_one();
        let _ = self.commands.send(RoomCommand::Leave {
            participant: self.participant,
        });
    }
}

/// Thread-safe registry for active rooms.
#[derive(Debug)]
pub struct RoomRegistry {
    /// Global settings applied to newly created rooms.
    settings: RoomSettings,
    /// Map of room id to active handle.
    rooms: RwLock<HashMap<String, RoomHandle>>,
}

impl RoomRegistry {
    /// Creates a new registry with the provided settings.
    pub fn new(settings: RoomSettings) -> Self {
        Self {
            settings,
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a new room and spawns its task.
    ///
    /// Pinned rooms stay up when empty; others are removed after their last participant leaves.
    pub async fn create_room(
        self: &Arc<Self>,
        room_id: String,
        pinned: bool,
    ) -> Result<RoomHandle, RoomError> {
        let mut rooms = self.rooms.write().await;
        if rooms.contains_key(&room_id) {
            return Err(RoomError::AlreadyExists);
        }

        let (commands, commands_rx) = mpsc::unbounded_channel::<RoomCommand>();
        let room_id_arc: Arc<str> = Arc::from(room_id.as_str());
        let state = RoomState::new(
            room_id_arc.clone(),
            self.settings.tuning.clone(),
            rand::random(),
        );

        // Spawn the room's sequencing task; it unregisters itself when done.
        let registry = Arc::clone(self);
        let id = room_id.clone();
        tokio::spawn(async move {
            room_task(state, commands_rx, pinned).await;
            registry.remove_room(&id).await;
        });

        let room = RoomHandle {
            room_id: room_id_arc,
            commands,
            next_participant: Arc::new(AtomicU64::new(1)),
            settings: self.settings.clone(),
        };

        rooms.insert(room_id, room.clone());
        info!(room_id = %room.room_id, pinned, "room created");
        Ok(room)
    }

    /// Returns a room handle for the provided id, if it exists.
    pub async fn get_room(&self, room_id: &str) -> Option<RoomHandle> {
        let rooms = self.rooms.read().await;
        rooms.get(room_id).cloned()
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    async fn remove_room(&self, room_id: &str) {
        let mut rooms = self.rooms.write().await;
        if rooms.remove(room_id).is_some() {
            info!(room_id, "room removed");
        }
    }
}

impl std::fmt::Debug for RoomHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomHandle")
            .field("room_id", &self.room_id)
            .finish_non_exhaustive()
    }
}
