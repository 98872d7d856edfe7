//! A single transient room: its participants, its owner, and the message
//! routing between them.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::close_cause::CloseCause;
use crate::codec::{Envelope, Route};
use crate::config::JoinRateLimitConfig;
use crate::participant::Participant;
use crate::rate_limit::JoinLimiterEntry;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RegisterError {
    #[error("room is locked")]
    ServerIsLocked,
    #[error("room is at its participant limit")]
    RoomLimitReached,
    #[error("name is already taken")]
    NameIsTaken,
    #[error("name must not be empty")]
    NamePropertyIsEmpty,
    #[error("banned by the join rate limiter")]
    BannedByRateLimit,
}

impl From<RegisterError> for CloseCause {
    fn from(e: RegisterError) -> Self {
        match e {
            RegisterError::ServerIsLocked => CloseCause::ServerIsLocked,
            RegisterError::RoomLimitReached => CloseCause::RoomLimitReached,
            RegisterError::NameIsTaken => CloseCause::NameIsTaken,
            RegisterError::NamePropertyIsEmpty => CloseCause::NamePropertyIsEmpty,
            RegisterError::BannedByRateLimit => CloseCause::BannedByRateLimit,
        }
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ReattachError {
    #[error("no participant with that name")]
    NameDoesntExist,
    #[error("secret does not match")]
    SuCodeMismatch,
}

impl From<ReattachError> for CloseCause {
    fn from(e: ReattachError) -> Self {
        match e {
            ReattachError::NameDoesntExist => CloseCause::NameDoesntExist,
            ReattachError::SuCodeMismatch => CloseCause::SuCodeMismatch,
        }
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AttachOwnerError {
    #[error("owner secret does not match")]
    SuAdminCodeMismatch,
}

impl From<AttachOwnerError> for CloseCause {
    fn from(_: AttachOwnerError) -> Self {
        CloseCause::SuAdminCodeMismatch
    }
}

struct RoomInner {
    owner_secret: String,
    owner_participant: Participant,
    owner_address: Option<String>,
    participants: HashMap<String, Participant>,
    lock: bool,
    limit: i64,
    public_log: Vec<Envelope>,
    join_limiter: HashMap<String, JoinLimiterEntry>,
}

/// A room: one owner, any number of named participants, and the history each
/// of them needs to replay on reconnect.
///
/// All mutable state lives behind a single mutex. The room's invariants
/// (registration ordering, broadcast fan-out ordering, shadow bookkeeping)
/// only hold if every operation takes that lock for its whole duration, so
/// every public method below does exactly that rather than taking it
/// piecemeal.
pub struct Room {
    pub code: String,
    join_rate_limit: JoinRateLimitConfig,
    inner: Mutex<RoomInner>,
}

impl Room {
    pub fn new(
        code: impl Into<String>,
        owner_secret: impl Into<String>,
        limit: i64,
        join_rate_limit: JoinRateLimitConfig,
    ) -> Self {
        Self {
            code: code.into(),
            join_rate_limit,
            inner: Mutex::new(RoomInner {
                owner_secret: owner_secret.into(),
                owner_participant: Participant::new("owner", ""),
                owner_address: None,
                participants: HashMap::new(),
                lock: false,
                limit,
                public_log: Vec::new(),
                join_limiter: HashMap::new(),
            }),
        }
    }

    pub fn set_owner_address(&self, address: impl Into<String>) {
        self.inner.lock().unwrap().owner_address = Some(address.into());
    }

    pub fn owner_address(&self) -> Option<String> {
        self.inner.lock().unwrap().owner_address.clone()
    }

    pub fn verify_owner_secret(&self, secret: &str) -> bool {
        self.inner.lock().unwrap().owner_secret == secret
    }

    pub fn set_lock(&self, lock: bool) {
        self.inner.lock().unwrap().lock = lock;
    }

    pub fn is_locked(&self) -> bool {
        self.inner.lock().unwrap().lock
    }

    pub fn participant_count(&self) -> usize {
        self.inner.lock().unwrap().participants.len()
    }

    /// Register a brand-new participant under `name`, subject to the join
    /// rate limiter keyed by `remote_address`. `session` is the already-open
    /// transport for this connection, bound before the `su`/replay envelopes
    /// are pushed so they actually reach the socket live instead of only
    /// surfacing later via `repeat`.
    ///
    /// Precondition order (deliberately fixed, see design notes): room
    /// locked, then participant limit, then name taken, then name empty,
    /// then the join rate limit. Returns the freshly minted secret on
    /// success.
    pub fn register(
        &self,
        name: &str,
        remote_address: &str,
        session: std::sync::Arc<dyn crate::transport::SessionHandle>,
    ) -> Result<String, RegisterError> {
        let mut inner = self.inner.lock().unwrap();

        if inner.lock {
            return Err(RegisterError::ServerIsLocked);
        }
        if inner.limit >= 1 && inner.participants.len() as i64 >= inner.limit {
            return Err(RegisterError::RoomLimitReached);
        }
        if inner.participants.contains_key(name) {
            return Err(RegisterError::NameIsTaken);
        }
        if name.is_empty() {
            return Err(RegisterError::NamePropertyIsEmpty);
        }
        if Self::check_rate_limit(&mut inner.join_limiter, remote_address, &self.join_rate_limit).is_err() {
            return Err(RegisterError::BannedByRateLimit);
        }

        let secret = uuid::Uuid::new_v4().to_string();
        let mut participant = Participant::new(name, secret.clone());
        participant.session = Some(session);
        participant.push(Envelope::Su { su: secret.clone() });
        for envelope in inner.public_log.clone() {
            participant.push(envelope);
        }

        inner.participants.insert(name.to_string(), participant);
        inner.owner_participant.push(Envelope::UserAppend { user: name.to_string() });
        debug!(room = %self.code, %name, "participant registered");
        Ok(secret)
    }

    fn check_rate_limit(
        limiter: &mut HashMap<String, JoinLimiterEntry>,
        address: &str,
        config: &JoinRateLimitConfig,
    ) -> Result<(), ()> {
        let entry = limiter
            .entry(address.to_string())
            .or_insert_with(JoinLimiterEntry::initial);
        let now = Instant::now();

        if let Some(banned_until) = entry.banned_until {
            if now < banned_until {
                return Err(());
            }
            entry.banned_until = None;
            entry.strikes = 0;
        }

        if now.duration_since(entry.window_start) < Duration::from_secs(config.per_n_seconds) {
            entry.strikes += 1;
            if entry.strikes >= config.max_users {
                entry.banned_until = Some(now + Duration::from_secs(config.ban_for));
                return Err(());
            }
        } else {
            entry.window_start = now;
            entry.strikes = 0;
        }

        Ok(())
    }

    /// Reattach to an existing participant with the matching secret. Any
    /// prior session for this participant is displaced with
    /// `CloseCause::Overridden`; the returned `next_seq` is what the fresh
    /// session should begin its replay request from.
    pub fn reattach(
        &self,
        name: &str,
        secret: &str,
    ) -> Result<u64, ReattachError> {
        let mut inner = self.inner.lock().unwrap();
        let participant = inner
            .participants
            .get_mut(name)
            .ok_or(ReattachError::NameDoesntExist)?;
        if participant.secret != secret {
            return Err(ReattachError::SuCodeMismatch);
        }
        if let Some(old) = participant.session.take() {
            old.close(CloseCause::Overridden);
        }
        let next_seq = participant.next_seq;
        inner.owner_participant.push(Envelope::UserJoin { user: name.to_string() });
        Ok(next_seq)
    }

    /// Bind `session` as the live transport for a participant that has
    /// already passed [`Room::register`] or [`Room::reattach`].
    pub fn attach_session(&self, name: &str, session: std::sync::Arc<dyn crate::transport::SessionHandle>) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(participant) = inner.participants.get_mut(name) {
            participant.session = Some(session);
        }
    }

    /// Attach the owner's live transport, authenticating with the room's
    /// owner secret.
    pub fn attach_owner(
        &self,
        secret: &str,
        session: std::sync::Arc<dyn crate::transport::SessionHandle>,
    ) -> Result<u64, AttachOwnerError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.owner_secret != secret {
            return Err(AttachOwnerError::SuAdminCodeMismatch);
        }
        if let Some(old) = inner.owner_participant.session.take() {
            old.close(CloseCause::Overridden);
        }
        inner.owner_participant.session = Some(session);
        Ok(inner.owner_participant.next_seq)
    }

    /// Replay entries for a participant (or the owner, via `Route::Owner`)
    /// starting from `expected_next`.
    pub fn generate_replay_for(&self, route: &Route, expected_next: u64) -> Vec<Value> {
        let inner = self.inner.lock().unwrap();
        match route {
            Route::Owner => inner.owner_participant.generate_replay(expected_next),
            Route::Named(name) => inner
                .participants
                .get(name)
                .map(|p| p.generate_replay(expected_next))
                .unwrap_or_default(),
            Route::All => Vec::new(),
        }
    }

    /// Send `content` from `sender` to `to`.
    ///
    /// For `Route::All`, the message is pushed to every participant
    /// (including the sender) and the owner, appended once to the public
    /// log, and followed by exactly one shadow entry in the sender's own
    /// history. For `Route::Owner`/`Route::Named`, the message is pushed to
    /// that one recipient and followed by one shadow entry in the sender's
    /// history. Unknown named recipients are silently dropped, matching a
    /// participant having disconnected mid-flight.
    pub fn send(&self, sender: &Route, to: &Route, content: Value) {
        let mut inner = self.inner.lock().unwrap();
        let envelope = Envelope::Msg { from: sender.wire_name(), am: content.clone() };

        match to {
            Route::All => {
                for participant in inner.participants.values_mut() {
                    participant.push(envelope.clone());
                }
                inner.owner_participant.push(envelope.clone());
                inner.public_log.push(envelope.clone());
            }
            Route::Owner => {
                inner.owner_participant.push(envelope.clone());
            }
            Route::Named(name) => {
                if let Some(participant) = inner.participants.get_mut(name) {
                    participant.push(envelope.clone());
                } else {
                    warn!(room = %self.code, %name, "dropped message to unknown participant");
                }
            }
        }

        let to_name = to.wire_name();
        Self::push_shadow_for(&mut inner, sender, to_name, content);
    }

    fn push_shadow_for(inner: &mut RoomInner, sender: &Route, to: String, content: Value) {
        match sender {
            Route::Owner => inner.owner_participant.push_shadow(to, content),
            Route::Named(name) => {
                if let Some(participant) = inner.participants.get_mut(name) {
                    participant.push_shadow(to, content);
                }
            }
            Route::All => {}
        }
    }

    /// Handle a `repeat` command: replay this sender's own history from
    /// `start` and write it directly to their current transport as a bare
    /// `Repeated` envelope. This bypasses `Participant::push` entirely: the
    /// response is not wrapped in the `{kind:"inbound", q, msg}` envelope,
    /// not appended to history, and does not advance `next_seq`.
    pub fn handle_repeat_command(&self, sender: &Route, start: u64) {
        let repeat = self.generate_replay_for(sender, start);
        let inner = self.inner.lock().unwrap();
        let envelope = Envelope::Repeated { start, repeat };
        let session = match sender {
            Route::Owner => inner.owner_participant.session.as_ref(),
            Route::Named(name) => inner.participants.get(name).and_then(|p| p.session.as_ref()),
            Route::All => None,
        };
        if let Some(session) = session
            && let Ok(text) = serde_json::to_string(&envelope)
        {
            let _ = session.send_text(&text);
        }
    }

    /// A session closed with a non-normal, non-application close code.
    /// Tell the owner this participant left uncleanly.
    pub fn notify_abnormal_close(&self, name: &str) {
        let mut inner = self.inner.lock().unwrap();
        if !inner.participants.contains_key(name) {
            return;
        }
        inner.owner_participant.push(Envelope::UserLeft { user: name.to_string() });
    }

    /// Close every live session in the room with `cause`: every participant
    /// first, then the owner last.
    pub fn close(&self, cause: CloseCause) {
        let inner = self.inner.lock().unwrap();
        for participant in inner.participants.values() {
            if let Some(session) = &participant.session {
                session.close(cause);
            }
        }
        if let Some(session) = &inner.owner_participant.session {
            session.close(cause);
        }
    }
}
