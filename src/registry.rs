//! Room code allocation and lookup across the whole relay.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rand::Rng;
use tracing::error;

use crate::config::JoinRateLimitConfig;
use crate::room::Room;

const CODE_LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const CODE_LENGTH: usize = 4;
const CODE_GEN_ATTEMPTS: usize = 64;

/// Every live room, keyed by its full room code.
pub struct Registry {
    rooms: Mutex<HashMap<String, Arc<Room>>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self { rooms: Mutex::new(HashMap::new()) }
    }

    /// Generate a fresh `prefix` + 4 random uppercase letters code not
    /// already present in `existing`. Gives up after a bounded number of
    /// collisions rather than looping forever.
    fn gen_code(prefix: &str, existing: &HashMap<String, Arc<Room>>) -> Option<String> {
        let mut rng = rand::thread_rng();
        for _ in 0..CODE_GEN_ATTEMPTS {
            let suffix: String = (0..CODE_LENGTH)
                .map(|_| CODE_LETTERS[rng.gen_range(0..CODE_LETTERS.len())] as char)
                .collect();
            let code = format!("{prefix}{suffix}");
            if !existing.contains_key(&code) {
                return Some(code);
            }
        }
        None
    }

    /// Allocate a fresh room code, create its `Room`, and register it.
    /// Returns `None` if no free code could be found (exhausted retries).
    pub fn create_room(
        &self,
        prefix: &str,
        owner_secret: &str,
        limit: i64,
        join_rate_limit: JoinRateLimitConfig,
    ) -> Option<(String, Arc<Room>)> {
        let mut rooms = self.rooms.lock().unwrap();
        let code = Self::gen_code(prefix, &rooms)?;
        let room = Arc::new(Room::new(code.clone(), owner_secret, limit, join_rate_limit));
        rooms.insert(code.clone(), room.clone());
        Some((code, room))
    }

    pub fn get(&self, code: &str) -> Option<Arc<Room>> {
        self.rooms.lock().unwrap().get(code).cloned()
    }

    /// Remove a room from the registry. Freeing a code that is no longer
    /// present is logged, not a panic: it can legitimately race a second
    /// close request for the same room.
    pub fn free(&self, code: &str) {
        if self.rooms.lock().unwrap().remove(code).is_none() {
            error!(%code, "attempted to free a room code that was not registered");
        }
    }

    pub fn room_count(&self) -> usize {
        self.rooms.lock().unwrap().len()
    }
}
