//! The seam between room/session logic and a live WebSocket.
//!
//! Room code never touches a socket directly; it only ever holds a
//! `dyn SessionHandle`. That keeps `room.rs` and `session.rs` testable with
//! [`StubSessionHandle`] and leaves the actual duplex-stream plumbing to
//! `routes::session`.

use std::fmt;
use std::sync::Mutex;

use tokio::sync::mpsc::UnboundedSender;

use crate::close_cause::CloseCause;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportError;

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to write to transport")
    }
}

impl std::error::Error for TransportError {}

/// A handle to one participant's live connection, as seen by room logic.
///
/// Sends are best-effort: a dead socket fails the call, and callers that push
/// history (see `Participant::push`) deliberately swallow that failure rather
/// than unwind, since a participant missing one frame should not break a
/// broadcast to everyone else.
pub trait SessionHandle: Send + Sync {
    fn send_text(&self, text: &str) -> Result<(), TransportError>;
    fn close(&self, cause: CloseCause);
}

/// Records what it was sent, for assertions in unit tests that exercise room
/// and session logic without a network.
#[derive(Default)]
pub struct StubSessionHandle {
    sent: Mutex<Vec<String>>,
    closed_with: Mutex<Option<CloseCause>>,
}

impl StubSessionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn closed_with(&self) -> Option<CloseCause> {
        *self.closed_with.lock().unwrap()
    }
}

impl SessionHandle for StubSessionHandle {
    fn send_text(&self, text: &str) -> Result<(), TransportError> {
        self.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }

    fn close(&self, cause: CloseCause) {
        *self.closed_with.lock().unwrap() = Some(cause);
    }
}

/// A command destined for the async task that owns the real duplex stream.
pub enum WsCommand {
    Text(String),
    Close(CloseCause),
}

/// A live handle backed by an unbounded channel into the task driving the
/// WebSocket. Cloning the sender is cheap, so this handle can be cloned into
/// an `Arc` and shared across every other participant that might address it.
pub struct WsSessionHandle {
    outbound: UnboundedSender<WsCommand>,
}

impl WsSessionHandle {
    pub fn new(outbound: UnboundedSender<WsCommand>) -> Self {
        Self { outbound }
    }
}

impl SessionHandle for WsSessionHandle {
    fn send_text(&self, text: &str) -> Result<(), TransportError> {
        self.outbound
            .send(WsCommand::Text(text.to_string()))
            .map_err(|_| TransportError)
    }

    fn close(&self, cause: CloseCause) {
        let _ = self.outbound.send(WsCommand::Close(cause));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_records_sent_text_and_close_cause() {
        let handle = StubSessionHandle::new();
        handle.send_text("hello").unwrap();
        handle.close(CloseCause::ServerClosing);
        assert_eq!(handle.sent(), vec!["hello".to_string()]);
        assert_eq!(handle.closed_with(), Some(CloseCause::ServerClosing));
    }
}
