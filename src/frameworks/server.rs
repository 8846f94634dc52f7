// Framework bootstrap for the skirmish server runtime.

use crate::frameworks::config;
use crate::interface_adapters::net::{create_room_handler, ws_handler};
use crate::interface_adapters::state::AppState;
use crate::use_cases::{RoomRegistry, RoomSettings};

use axum::{
    Router,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::{io::Result, sync::Arc};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    let address = listener.local_addr()?;
    let state = build_state().await?;
    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/rooms", post(create_room_handler))
        .with_state(state);

    tracing::info!(%address, "listening");

    // Serve app and report errors rather than panicking
    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::from(([127, 0, 0, 1], config::http_port()));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}

async fn build_state() -> Result<Arc<AppState>> {
    let tuning = config::load_tuning().map_err(|e| {
        tracing::error!(error = %e, "failed to load tuning");
        std::io::Error::other(e)
    })?;
    let tick_interval = config::tick_interval();
    tracing::debug!(
        tick_interval_ms = tick_interval.as_millis(),
        prefabs = tuning.projectiles.len(),
        "tuning loaded"
    );

    let room_registry = Arc::new(RoomRegistry::new(RoomSettings {
        event_channel_capacity: config::EVENT_CHANNEL_CAPACITY,
        world_broadcast_capacity: config::WORLD_BROADCAST_CAPACITY,
        tick_interval,
        tuning: Arc::new(tuning),
    }));

    // The default room is pinned so it survives while empty.
    room_registry
        .create_room(config::DEFAULT_ROOM_ID.to_string(), true)
        .await
        .map_err(|e| std::io::Error::other(format!("failed to create default room: {e:?}")))?;

    Ok(Arc::new(AppState {
        room_registry,
        default_room_id: Arc::from(config::DEFAULT_ROOM_ID),
    }))
}
