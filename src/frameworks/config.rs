use crate::domain::Tuning;
use std::{env, path::PathBuf, time::Duration};

// Runtime/server constants (not gameplay tuning).

pub const EVENT_CHANNEL_CAPACITY: usize = 1024;
pub const WORLD_BROADCAST_CAPACITY: usize = 128;
pub const DEFAULT_ROOM_ID: &str = "arena";

const DEFAULT_TICK_HZ: u32 = 60;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read tuning file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse tuning file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub fn http_port() -> u16 {
    env::var("SKIRMISH_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3001)
}

pub fn tick_interval() -> Duration {
    let hz = env::var("SKIRMISH_TICK_HZ")
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
        .filter(|hz| *hz > 0)
        .unwrap_or(DEFAULT_TICK_HZ);
    tick_interval_for(hz)
}

fn tick_interval_for(hz: u32) -> Duration {
    Duration::from_secs_f64(1.0 / f64::from(hz.max(1)))
}

pub fn tuning_path() -> Option<PathBuf> {
    env::var_os("SKIRMISH_TUNING_PATH").map(PathBuf::from)
}

/// Loads gameplay tuning from `SKIRMISH_TUNING_PATH`, or defaults when unset.
pub fn load_tuning() -> Result<Tuning, ConfigError> {
    match tuning_path() {
        Some(path) => load_tuning_from(path),
        None => Ok(Tuning::default()),
    }
}

pub fn load_tuning_from(path: PathBuf) -> Result<Tuning, ConfigError> {
    let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    parse_tuning(&raw).map_err(|source| ConfigError::Parse { path, source })
}

fn parse_tuning(raw: &str) -> Result<Tuning, toml::de::Error> {
    toml::from_str(raw)
}
