use crate::interface_adapters::http::ErrorResponse;
use crate::interface_adapters::protocol::{ClientMessage, ServerMessage, WorldUpdateDto};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::rng::next_id;
use crate::use_cases::{ClientEvent, ParticipantHandle, RoomHandle, WorldUpdate};

use axum::{
    Error,
    extract::{
        Query, State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures::SinkExt;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::timeout;
use tracing::{Instrument, debug, error, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    // Categorizes connection lifecycle failures so callers can decide policy.
    #[allow(dead_code)]
    Ws(axum::Error),
    #[allow(dead_code)]
    Serialization(serde_json::Error),
    EventsClosed,
    WorldUpdatesClosed,
    JoinRequired,
    JoinTimeout,
    RoomClosed,
    ClosedBeforeJoin,
}

#[derive(Debug, serde::Deserialize)]
pub struct RoomQuery {
    // The room id the client wants to join.
    #[serde(default)]
    room_id: Option<String>,
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_JSON: u32 = 10;
const MAX_DISPLAY_NAME_LEN: usize = 32;
const JOIN_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn world_update_serializer(
    mut world_rx: broadcast::Receiver<WorldUpdate>,
    world_bytes_tx: broadcast::Sender<Utf8Bytes>,
    world_latest_tx: watch::Sender<Utf8Bytes>,
) {
    // Serialize each world update once and broadcast the shared bytes.
    loop {
        match world_rx.recv().await {
            Ok(update) => {
                let msg = ServerMessage::WorldUpdate(WorldUpdateDto::from(update));
                let txt = match serde_json::to_string(&msg) {
                    Ok(txt) => txt,
                    Err(e) => {
                        error!(error = ?e, "failed to serialize world update");
                        continue;
                    }
                };

                let bytes = Utf8Bytes::from(txt);
                // Store the latest bytes for lag recovery.
                let _ = world_latest_tx.send(bytes.clone());
                let _ = world_bytes_tx.send(bytes);
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(
                    missed = n,
                    "world serializer lagged; skipping to latest update"
                );
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!("world updates channel closed; serializer exiting");
                break;
            }
        }
    }
}

pub fn spawn_participant_serializer(participant: &ParticipantHandle) {
    tokio::spawn(world_update_serializer(
        participant.world_tx.subscribe(),
        participant.world_bytes_tx.clone(),
        participant.world_latest_tx.clone(),
    ));
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<RoomQuery>,
) -> impl IntoResponse {
    let room_id = query
        .room_id
        .unwrap_or_else(|| state.default_room_id.to_string());

    let room = match state.room_registry.get_room(&room_id).await {
        Some(room) => room,
        None => {
            return ErrorResponse::respond(StatusCode::NOT_FOUND, "room not found");
        }
    };

    // Separate connection id for correlating logs before/after a participant exists.
    let conn_id = next_id();
    let span = info_span!(
        "conn",
        conn_id,
        room_id = %room.room_id,
        participant = tracing::field::Empty
    );
    ws.on_upgrade(move |socket| handle_socket(socket, room).instrument(span))
}

async fn handle_socket(mut socket: WebSocket, room: RoomHandle) {
    let mut ctx = match bootstrap_connection(&mut socket, &room).await {
        Ok(ctx) => ctx,
        Err(NetError::ClosedBeforeJoin) => {
            info!("client disconnected before join handshake");
            return;
        }
        Err(e) => {
            error!(error = ?e, "failed to bootstrap connection");
            let _ = send_close_with_reason(&mut socket, close_code::POLICY, "bootstrap failed").await;
            return;
        }
    };

    tracing::Span::current().record("participant", ctx.participant.participant.0);
    info!(
        player_id = ctx.participant.player_id.0,
        display_name = %ctx.display_name,
        "client connected"
    );

    if let Err(e) = run_client_loop(&mut socket, &mut ctx).await {
        warn!(error = ?e, "client loop exited with error");
    }
}

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<usize, NetError> {
    let txt = serde_json::to_string(msg).map_err(NetError::Serialization)?;
    let bytes = txt.len();
    socket
        .send(Message::Text(txt.into()))
        .await
        .map_err(NetError::Ws)?;
    Ok(bytes)
}

struct ConnCtx {
    pub participant: ParticipantHandle,
    pub display_name: String,
    pub events_tx: mpsc::Sender<ClientEvent>,
    pub world_bytes_rx: broadcast::Receiver<Utf8Bytes>,
    pub world_latest_rx: watch::Receiver<Utf8Bytes>,
    pub lag_recovery_count: u64,

    pub msgs_in: u64,
    pub msgs_out: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,

    pub invalid_json: u32,

    pub last_events_full_log: Instant,
    pub last_world_lag_log: Instant,
    pub last_invalid_input_log: Instant,

    pub close_frame: Option<CloseFrame>,
}

async fn bootstrap_connection(
    socket: &mut WebSocket,
    room: &RoomHandle,
) -> Result<ConnCtx, NetError> {
    let join = match timeout(JOIN_HANDSHAKE_TIMEOUT, read_join_handshake(socket)).await {
        Ok(result) => result?,
        Err(_) => {
            let _ = send_close_with_reason(socket, close_code::POLICY, "join timeout").await;
            return Err(NetError::JoinTimeout);
        }
    };

    let participant = room
        .join(join.display_name.clone())
        .map_err(|_| NetError::RoomClosed)?;

    // Subscribe before the first await so the first serialized tick is not missed.
    let world_bytes_rx = participant.world_bytes_tx.subscribe();
    let world_latest_rx = participant.world_latest_tx.subscribe();
    spawn_participant_serializer(&participant);

    let identity_msg = ServerMessage::Identity {
        participant_id: participant.participant.0,
        player_id: participant.player_id.0,
    };
    if let Err(err) = send_message(socket, &identity_msg).await {
        // Release the room slot if the handshake fails after admission.
        participant.leave();
        return Err(err);
    }

    let now = Instant::now() - LOG_THROTTLE;
    Ok(ConnCtx {
        events_tx: participant.events_tx.clone(),
        participant,
        display_name: join.display_name,
        world_bytes_rx,
        world_latest_rx,
        lag_recovery_count: 0,

        msgs_in: join.msgs_in,
        msgs_out: 1,
        bytes_in: join.bytes_in,
        bytes_out: 0,

        invalid_json: 0,

        last_events_full_log: now,
        last_world_lag_log: now,
        last_invalid_input_log: now,

        close_frame: None,
    })
}

#[derive(Debug)]
struct JoinHandshake {
    display_name: String,
    bytes_in: u64,
    msgs_in: u64,
}

enum LoopControl {
    Continue,
    Disconnect,
}

async fn send_close_with_reason(
    socket: &mut WebSocket,
    code: u16,
    reason: &'static str,
) -> Result<(), NetError> {
    socket
        .send(Message::Close(Some(CloseFrame {
            code,
            reason: reason.into(),
        })))
        .await
        .map_err(NetError::Ws)?;
    socket.close().await.map_err(NetError::Ws)
}

fn sanitize_display_name(raw: &str) -> String {
    let name: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_DISPLAY_NAME_LEN)
        .collect();
    if name.is_empty() {
        "player".to_string()
    } else {
        name
    }
}

async fn read_join_handshake(socket: &mut WebSocket) -> Result<JoinHandshake, NetError> {
    loop {
        let Some(incoming) = socket.recv().await else {
            return Err(NetError::ClosedBeforeJoin);
        };

        match incoming.map_err(NetError::Ws)? {
            Message::Text(text) => {
                let bytes_in = text.len() as u64;
                return match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Join(payload)) => Ok(JoinHandshake {
                        display_name: sanitize_display_name(&payload.display_name),
                        bytes_in,
                        msgs_in: 1,
                    }),
                    Ok(_) => {
                        let _ = send_close_with_reason(socket, close_code::POLICY, "join required")
                            .await;
                        Err(NetError::JoinRequired)
                    }
                    Err(_) => {
                        let _ = send_close_with_reason(
                            socket,
                            close_code::POLICY,
                            "invalid join payload",
                        )
                        .await;
                        Err(NetError::JoinRequired)
                    }
                };
            }
            Message::Binary(_) => {
                let _ = send_close_with_reason(
                    socket,
                    close_code::UNSUPPORTED,
                    "binary messages not supported",
                )
                .await;
                return Err(NetError::JoinRequired);
            }
            Message::Ping(_) | Message::Pong(_) => {}
            Message::Close(_) => return Err(NetError::ClosedBeforeJoin),
        }
    }
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

fn sanitize_event(event: ClientEvent) -> Option<ClientEvent> {
    let finite = match &event {
        ClientEvent::Transform { position, yaw } => position.is_finite() && yaw.is_finite(),
        ClientEvent::Fire { yaw } => yaw.is_finite(),
    };
    finite.then_some(event)
}

fn forward_event(
    events_tx: &mpsc::Sender<ClientEvent>,
    event: ClientEvent,
    last_events_full_log: &mut Instant,
    last_invalid_input_log: &mut Instant,
) -> Result<LoopControl, NetError> {
    let Some(event) = sanitize_event(event) else {
        if should_log(last_invalid_input_log) {
            warn!("invalid input values (NaN/inf); dropping");
        }
        return Ok(LoopControl::Continue);
    };

    match events_tx.try_send(event) {
        Ok(()) => Ok(LoopControl::Continue),
        Err(mpsc::error::TrySendError::Full(_)) => {
            if should_log(last_events_full_log) {
                warn!("event channel full; dropping input");
            }
            Ok(LoopControl::Continue)
        }
        Err(mpsc::error::TrySendError::Closed(_)) => Err(NetError::EventsClosed),
    }
}

async fn run_client_loop(socket: &mut WebSocket, ctx: &mut ConnCtx) -> Result<(), NetError> {
    // Split borrows so `tokio::select!` can hold them concurrently.
    let ConnCtx {
        participant,
        events_tx,
        world_bytes_rx,
        world_latest_rx,
        lag_recovery_count,
        msgs_in,
        msgs_out,
        bytes_in,
        bytes_out,
        invalid_json,
        last_events_full_log,
        last_world_lag_log,
        last_invalid_input_log,
        close_frame,
        ..
    } = ctx;

    let mut fatal: Option<NetError> = None;

    loop {
        let disconnect: bool = tokio::select! {
            incoming = socket.recv() => {
                match handle_incoming_ws(
                    incoming,
                    events_tx,
                    msgs_in,
                    bytes_in,
                    invalid_json,
                    last_events_full_log,
                    last_invalid_input_log,
                    close_frame,
                ) {
                    Ok(LoopControl::Continue) => false,
                    Ok(LoopControl::Disconnect) => true,
                    Err(e) => {
                        fatal = Some(e);
                        true
                    }
                }
            }

            world_msg = world_bytes_rx.recv() => {
                match world_msg {
                    Ok(bytes) => match forward_world_bytes(bytes, socket, msgs_out, bytes_out).await {
                        LoopControl::Continue => false,
                        LoopControl::Disconnect => true,
                    },
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        if should_log(last_world_lag_log) {
                            warn!(missed = n, "world updates lagged; sending snapshot");
                        }

                        // Resync strategy: send the latest world snapshot.
                        let latest = world_latest_rx.borrow().clone();
                        if latest.is_empty() {
                            false
                        } else {
                            *lag_recovery_count += 1;
                            match forward_world_bytes(latest, socket, msgs_out, bytes_out).await {
                                LoopControl::Continue => false,
                                LoopControl::Disconnect => true,
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        fatal = Some(NetError::WorldUpdatesClosed);
                        true
                    }
                }
            }
        };

        if disconnect {
            if let Some(frame) = close_frame.take() {
                let _ = socket.send(Message::Close(Some(frame))).await;
            }
            if let Err(err) = socket.close().await.map_err(NetError::Ws) {
                debug!(error = ?err, "socket close error");
            }
            break;
        }
    }

    // The room destroys the avatar and migrates adopted agents.
    participant.leave();

    debug!(
        msgs_in = *msgs_in,
        msgs_out = *msgs_out,
        bytes_in = *bytes_in,
        bytes_out = *bytes_out,
        invalid_json = *invalid_json,
        lag_recovery_count = *lag_recovery_count,
        "connection stats"
    );
    info!("client disconnected");

    match fatal {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_incoming_ws(
    incoming: Option<Result<Message, Error>>,
    events_tx: &mpsc::Sender<ClientEvent>,
    msgs_in: &mut u64,
    bytes_in: &mut u64,
    invalid_json: &mut u32,
    last_events_full_log: &mut Instant,
    last_invalid_input_log: &mut Instant,
    close_frame: &mut Option<CloseFrame>,
) -> Result<LoopControl, NetError> {
    match incoming {
        Some(Ok(msg)) => match msg {
            Message::Text(text) => {
                *msgs_in += 1;
                *bytes_in += text.len() as u64;

                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Join(_)) => {
                        // Ignore repeated Join packets after bootstrap to keep the session stable.
                        if should_log(last_invalid_input_log) {
                            warn!("duplicate join ignored");
                        }
                        Ok(LoopControl::Continue)
                    }
                    Ok(ClientMessage::Transform(transform)) => forward_event(
                        events_tx,
                        transform.into(),
                        last_events_full_log,
                        last_invalid_input_log,
                    ),
                    Ok(ClientMessage::Fire(fire)) => forward_event(
                        events_tx,
                        fire.into(),
                        last_events_full_log,
                        last_invalid_input_log,
                    ),
                    Err(parse_err) => {
                        *invalid_json += 1;
                        if should_log(last_invalid_input_log) {
                            warn!(
                                bytes = text.len(),
                                error = %parse_err,
                                "failed to parse client message"
                            );
                        }

                        if *invalid_json > MAX_INVALID_JSON {
                            *close_frame = Some(CloseFrame {
                                code: close_code::POLICY,
                                reason: "too many invalid messages".into(),
                            });
                            return Ok(LoopControl::Disconnect);
                        }

                        Ok(LoopControl::Continue)
                    }
                }
            }
            Message::Binary(_) => {
                *close_frame = Some(CloseFrame {
                    code: close_code::UNSUPPORTED,
                    reason: "binary messages not supported".into(),
                });
                Ok(LoopControl::Disconnect)
            }
            Message::Ping(_) | Message::Pong(_) => Ok(LoopControl::Continue),
            Message::Close(_) => Ok(LoopControl::Disconnect),
        },
        Some(Err(e)) => {
            warn!(error = %e, "websocket recv error");
            Ok(LoopControl::Disconnect)
        }
        None => {
            info!("websocket closed");
            Ok(LoopControl::Disconnect)
        }
    }
}

async fn forward_world_bytes(
    world_msg: Utf8Bytes,
    socket: &mut WebSocket,
    msgs_out: &mut u64,
    bytes_out: &mut u64,
) -> LoopControl {
    let bytes_len = world_msg.len();
    match socket
        .send(Message::Text(world_msg))
        .await
        .map_err(NetError::Ws)
    {
        Ok(()) => {
            *msgs_out += 1;
            *bytes_out += bytes_len as u64;
            LoopControl::Continue
        }
        Err(err) => {
            warn!(error = ?err, "failed to send world update");
            LoopControl::Disconnect
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn when_display_name_is_blank_then_default_is_used() {
        assert_eq!(sanitize_display_name("   "), "player");
    }

    #[test]
    fn when_display_name_is_long_then_it_is_truncated() {
        let name = sanitize_display_name(&"x".repeat(100));
        assert_eq!(name.len(), MAX_DISPLAY_NAME_LEN);
    }

    #[test]
    fn when_event_has_nan_then_it_is_dropped() {
        let event = ClientEvent::Transform {
            position: Vec3::new(f32::NAN, 0.0, 0.0),
            yaw: 0.0,
        };
        assert_eq!(sanitize_event(event), None);
        assert!(sanitize_event(ClientEvent::Fire { yaw: 1.0 }).is_some());
    }
}
