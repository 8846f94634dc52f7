// Use cases layer: rooms, participant replicas and the per-participant game loop.

pub mod game;
pub mod replica;
pub mod room;
pub mod rooms;
pub mod simulation;
pub mod types;

pub use replica::ParticipantNet;
pub use room::RoomState;
pub use rooms::{ParticipantHandle, RoomError, RoomHandle, RoomRegistry, RoomSettings};
pub use simulation::Simulation;
pub use types::{
    ClientEvent, Delivery, Outbound, ReplicaOp, RoomCommand, SpawnKind, SpawnRecord, WorldUpdate,
};
