//! Control-plane operations: create and close rooms, independent of any HTTP
//! framing (that lives in `routes::control`).

use thiserror::Error;
use tracing::info;

use crate::config::JoinRateLimitConfig;
use crate::rate_limit::OwnershipCounter;
use crate::registry::Registry;

/// No single remote address may own more than this many rooms at once.
pub const OWNERSHIP_CAP: u32 = 3;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CreateRoomError {
    #[error("owner address has reached its room ownership cap")]
    OwnershipCapReached,
    #[error("could not allocate a free room code")]
    CodeAllocationExhausted,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CloseRoomError {
    #[error("no room with that code")]
    NotFound,
    #[error("owner secret does not match")]
    Unauthorized,
}

pub struct CreatedRoom {
    pub code: String,
    pub owner_secret: String,
}

/// The control-plane surface: room creation and closure, backed by a
/// [`Registry`] and an [`OwnershipCounter`].
pub struct ControlPlane<'a> {
    pub registry: &'a Registry,
    pub ownership: &'a OwnershipCounter,
    pub join_rate_limit: JoinRateLimitConfig,
}

impl<'a> ControlPlane<'a> {
    pub fn new(registry: &'a Registry, ownership: &'a OwnershipCounter, join_rate_limit: JoinRateLimitConfig) -> Self {
        Self { registry, ownership, join_rate_limit }
    }

    /// Create a room owned by `requester_address`, subject to the ownership
    /// cap. `prefix` and `limit` are passed straight through to room
    /// allocation.
    pub fn create_room(
        &self,
        prefix: &str,
        limit: i64,
        requester_address: &str,
    ) -> Result<CreatedRoom, CreateRoomError> {
        if self.ownership.count_for(requester_address) >= OWNERSHIP_CAP {
            return Err(CreateRoomError::OwnershipCapReached);
        }

        let owner_secret = uuid::Uuid::new_v4().to_string();
        let (code, room) = self
            .registry
            .create_room(prefix, &owner_secret, limit, self.join_rate_limit)
            .ok_or(CreateRoomError::CodeAllocationExhausted)?;
        room.set_owner_address(requester_address);
        self.ownership.increment(requester_address);

        info!(room = %code, owner = %requester_address, "room created");
        Ok(CreatedRoom { code, owner_secret })
    }

    /// Close a room, authenticating the request with its owner secret, and
    /// release its slot from the ownership counter.
    pub fn close_room(&self, code: &str, owner_secret: &str) -> Result<(), CloseRoomError> {
        let room = self.registry.get(code).ok_or(CloseRoomError::NotFound)?;
        if !room.verify_owner_secret(owner_secret) {
            return Err(CloseRoomError::Unauthorized);
        }

        room.close(crate::close_cause::CloseCause::ServerClosing);
        self.registry.free(code);
        if let Some(address) = room.owner_address() {
            self.ownership.decrement(&address);
        }

        info!(room = %code, "room closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_room_succeeds_and_increments_ownership() {
        let registry = Registry::new();
        let ownership = OwnershipCounter::new();
        let plane = ControlPlane::new(&registry, &ownership, JoinRateLimitConfig::default());

        let created = plane.create_room("", 0, "1.2.3.4").unwrap();
        assert_eq!(ownership.count_for("1.2.3.4"), 1);
        assert!(registry.get(&created.code).is_some());
    }

    #[test]
    fn create_room_rejects_past_ownership_cap() {
        let registry = Registry::new();
        let ownership = OwnershipCounter::new();
        let plane = ControlPlane::new(&registry, &ownership, JoinRateLimitConfig::default());

        for _ in 0..OWNERSHIP_CAP {
            plane.create_room("", 0, "1.2.3.4").unwrap();
        }
        assert_eq!(
            plane.create_room("", 0, "1.2.3.4").unwrap_err(),
            CreateRoomError::OwnershipCapReached
        );
    }

    #[test]
    fn close_room_requires_matching_owner_secret() {
        let registry = Registry::new();
        let ownership = OwnershipCounter::new();
        let plane = ControlPlane::new(&registry, &ownership, JoinRateLimitConfig::default());

        let created = plane.create_room("", 0, "1.2.3.4").unwrap();
        assert_eq!(
            plane.close_room(&created.code, "wrong").unwrap_err(),
            CloseRoomError::Unauthorized
        );
        plane.close_room(&created.code, &created.owner_secret).unwrap();
        assert!(registry.get(&created.code).is_none());
        assert_eq!(ownership.count_for("1.2.3.4"), 0);
    }

    #[test]
    fn close_room_unknown_code_is_not_found() {
        let registry = Registry::new();
        let ownership = OwnershipCounter::new();
        let plane = ControlPlane::new(&registry, &ownership, JoinRateLimitConfig::default());
        assert_eq!(plane.close_room("NOPE", "x").unwrap_err(), CloseRoomError::NotFound);
    }
}
