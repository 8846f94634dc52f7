use rand::{Rng, distributions::Alphanumeric};
use std::sync::atomic::{AtomicU64, Ordering};

const ROOM_ID_LEN: usize = 8;

/// Returns a process-unique, monotonically increasing connection identifier.
pub fn next_id() -> u64 {
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Generates a short lowercase room id for rooms created without one.
pub fn generate_room_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ROOM_ID_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}
