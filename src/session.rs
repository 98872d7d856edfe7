//! The session state machine: classifying an inbound connection's intent,
//! dispatching register/reattach/owner-attach against a [`Room`], parsing
//! inbound command frames, and routing their effects.
//!
//! Everything here is pure with respect to the transport: it only ever talks
//! to a [`Room`] and a [`SessionHandle`], never to a socket directly, so it
//! is fully exercisable with [`crate::transport::StubSessionHandle`].

use std::sync::Arc;

use serde_json::Value;

use crate::close_cause::CloseCause;
use crate::codec::Route;
use crate::registry::Registry;
use crate::room::{AttachOwnerError, ReattachError, RegisterError, Room};
use crate::transport::SessionHandle;

/// What an inbound session-open request is asking to do, per the
/// name?/secret? classification table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionIntent {
    Register { name: String },
    Reattach { name: String, secret: String },
    AttachOwner { secret: String },
    Malformed,
}

/// Classify a session-open request from its `name`/`su` query parameters.
pub fn classify(name: Option<&str>, secret: Option<&str>) -> SessionIntent {
    match (name, secret) {
        (Some(name), None) => SessionIntent::Register { name: name.to_string() },
        (Some(name), Some(secret)) => {
            SessionIntent::Reattach { name: name.to_string(), secret: secret.to_string() }
        }
        (None, Some(secret)) => SessionIntent::AttachOwner { secret: secret.to_string() },
        (None, None) => SessionIntent::Malformed,
    }
}

/// Why a session-open request did not result in an attached session.
///
/// `Malformed` requests never established a session to begin with (no name,
/// no secret) and are rejected before any transport upgrade completes;
/// `Close` requests did pass classification but failed a room precondition,
/// and are reported via the matching application close cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOpenError {
    Close(CloseCause),
    Malformed,
}

impl From<CloseCause> for SessionOpenError {
    fn from(cause: CloseCause) -> Self {
        SessionOpenError::Close(cause)
    }
}

impl From<RegisterError> for SessionOpenError {
    fn from(e: RegisterError) -> Self {
        SessionOpenError::Close(e.into())
    }
}

impl From<ReattachError> for SessionOpenError {
    fn from(e: ReattachError) -> Self {
        SessionOpenError::Close(e.into())
    }
}

impl From<AttachOwnerError> for SessionOpenError {
    fn from(e: AttachOwnerError) -> Self {
        SessionOpenError::Close(e.into())
    }
}

/// Open a session against `registry`, attaching `handle` as the live
/// transport on success. Returns the [`Route`] this session now owns
/// (`Route::Owner` or `Route::Named`), so callers can address subsequent
/// commands and close events back to the right identity.
pub fn open_session(
    registry: &Registry,
    code: &str,
    intent: SessionIntent,
    remote_address: &str,
    handle: Arc<dyn SessionHandle>,
) -> Result<Route, SessionOpenError> {
    let intent = match intent {
        SessionIntent::Malformed => return Err(SessionOpenError::Malformed),
        other => other,
    };

    let room = registry.get(code).ok_or(SessionOpenError::Close(CloseCause::ServerCodeDoesntExist))?;

    match intent {
        SessionIntent::Register { name } => {
            room.register(&name, remote_address, handle)?;
            Ok(Route::Named(name))
        }
        SessionIntent::Reattach { name, secret } => {
            room.reattach(&name, &secret)?;
            room.attach_session(&name, handle);
            Ok(Route::Named(name))
        }
        SessionIntent::AttachOwner { secret } => {
            room.attach_owner(&secret, handle)?;
            Ok(Route::Owner)
        }
        SessionIntent::Malformed => unreachable!("handled above"),
    }
}

/// A parsed inbound command frame, ready to dispatch against a room.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Lock,
    Unlock,
    Chat { to: Route, content: Value },
    Chats(Vec<(Route, Value)>),
    Repeat(u64),
}

/// Parse the `to` sentinel/name convention shared by chat payloads and
/// outbound wire names (see [`Route::wire_name`]): `"owner"` and `"all"` are
/// reserved, anything else addresses a named participant.
fn parse_route(raw: &str) -> Route {
    match raw {
        "owner" => Route::Owner,
        "all" => Route::All,
        other => Route::Named(other.to_string()),
    }
}

fn parse_chat_payload(payload: &Value) -> Option<(Route, Value)> {
    let to = payload.get("to")?.as_str()?;
    let content = payload.get("content")?.clone();
    Some((parse_route(to), content))
}

/// Parse one inbound text frame into a [`Command`].
///
/// Frames of length <= 1 are the keepalive convention and are silently
/// ignored. Anything else is split at the first space into a command word
/// and a JSON payload; an unrecognized command word, invalid JSON, or a
/// payload shape mismatch drops the frame without closing the session.
pub fn parse_frame(text: &str) -> Option<Command> {
    if text.len() <= 1 {
        return None;
    }
    let (word, rest) = text.split_once(' ')?;
    let payload: Value = serde_json::from_str(rest).ok()?;

    match word {
        "lock" => Some(Command::Lock),
        "unlock" => Some(Command::Unlock),
        "chat" => parse_chat_payload(&payload).map(|(to, content)| Command::Chat { to, content }),
        "chats" => {
            let items = payload.as_array()?;
            let parsed = items.iter().map(parse_chat_payload).collect::<Option<Vec<_>>>()?;
            Some(Command::Chats(parsed))
        }
        "repeat" => payload.as_u64().map(Command::Repeat),
        _ => None,
    }
}

/// Apply a parsed command against `room` on behalf of `sender`.
///
/// `lock`/`unlock` are silently dropped (not an error) unless `sender` is the
/// owner slot; everything else routes through the room's fan-out and replay
/// machinery exactly as parsed.
pub fn dispatch_command(room: &Room, sender: &Route, command: Command) {
    match command {
        Command::Lock => {
            if matches!(sender, Route::Owner) {
                room.set_lock(true);
            }
        }
        Command::Unlock => {
            if matches!(sender, Route::Owner) {
                room.set_lock(false);
            }
        }
        Command::Chat { to, content } => room.send(sender, &to, content),
        Command::Chats(items) => {
            for (to, content) in items {
                room.send(sender, &to, content);
            }
        }
        Command::Repeat(start) => room.handle_repeat_command(sender, start),
    }
}

/// A session closed with `code`. If it was abnormal (not the clean-shutdown
/// code 1000, and not a relay-issued application cause, i.e. `code < 4000`),
/// tell the rest of the room this participant dropped.
pub fn on_session_close(room: &Room, route: &Route, code: u16) {
    if code == 1000 || code >= 4000 {
        return;
    }
    if let Route::Named(name) = route {
        room.notify_abnormal_close(name);
    }
}
