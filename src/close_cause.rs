//! Application-level WebSocket close causes the relay issues itself.
//!
//! All values live in the 4000 range so a client can tell them apart from
//! transport-level close codes (RFC 6455 reserves 4000-4999 for private use).

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CloseCause {
    #[error("unknown room")]
    ServerCodeDoesntExist,
    #[error("registration refused, room is locked")]
    ServerIsLocked,
    #[error("name is already taken")]
    NameIsTaken,
    #[error("no participant with that name")]
    NameDoesntExist,
    #[error("secret does not match")]
    SuCodeMismatch,
    #[error("owner secret does not match")]
    SuAdminCodeMismatch,
    #[error("name must not be empty")]
    NamePropertyIsEmpty,
    #[error("room participant limit reached")]
    RoomLimitReached,
    #[error("displaced by a fresher session")]
    Overridden,
    #[error("unsupported protocol version")]
    BreakingApiChange,
    #[error("room is closing")]
    ServerClosing,
    #[error("banned by rate limit")]
    BannedByRateLimit,
}

impl CloseCause {
    pub const fn code(self) -> u16 {
        match self {
            Self::ServerCodeDoesntExist => 4000,
            Self::ServerIsLocked => 4001,
            Self::NameIsTaken => 4002,
            Self::NameDoesntExist => 4003,
            Self::SuCodeMismatch => 4004,
            Self::SuAdminCodeMismatch => 4005,
            Self::NamePropertyIsEmpty => 4006,
            Self::RoomLimitReached => 4007,
            Self::Overridden => 4010,
            Self::BreakingApiChange => 4019,
            Self::ServerClosing => 4020,
            Self::BannedByRateLimit => 4030,
        }
    }
}
