use crate::interface_adapters::http::ErrorResponse;
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::rng::generate_room_id;
use crate::use_cases::RoomError;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

#[derive(Debug, serde::Deserialize)]
pub struct RoomCreateRequest {
    // Requested room id; a random one is generated when absent.
    #[serde(default)]
    room_id: Option<String>,
}

#[derive(Debug, serde::Serialize)]
struct RoomCreateResponse {
    room_id: String,
}

pub async fn create_room_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RoomCreateRequest>,
) -> impl IntoResponse {
    let room_id = match payload.room_id {
        Some(requested) => requested.trim().to_string(),
        None => generate_room_id(),
    };
    if room_id.is_empty() {
        return ErrorResponse::respond(StatusCode::BAD_REQUEST, "room_id must not be empty");
    }

    // Created rooms are not pinned and go away after their last participant leaves.
    match state
        .room_registry
        .create_room(room_id.clone(), false)
        .await
    {
        Ok(_) => (StatusCode::CREATED, Json(RoomCreateResponse { room_id })).into_response(),
        Err(RoomError::AlreadyExists) => {
            ErrorResponse::respond(StatusCode::CONFLICT, "room already exists")
        }
        Err(RoomError::Closed) => {
            ErrorResponse::respond(StatusCode::SERVICE_UNAVAILABLE, "room closed")
        }
    }
}
