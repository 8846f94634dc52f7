use crate::use_cases::RoomRegistry;
use std::sync::Arc;

pub struct AppState {
    // Active rooms keyed by id.
    pub room_registry: Arc<RoomRegistry>,
    // Room used when a client connects without a room_id.
    pub default_room_id: Arc<str>,
}
