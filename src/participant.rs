//! A single participant's identity, transport handle, and replay history.

use std::sync::Arc;

use serde_json::Value;

use crate::codec::{Envelope, OutboundWrapper, ShadowBody};
use crate::transport::SessionHandle;

/// One room member: a named participant or the owner.
///
/// `history` retains every envelope ever pushed to this participant, plus
/// shadow entries recording what this participant itself sent, in emission
/// order. `next_seq` only counts pushed (non-shadow) entries; it is the `q`
/// a freshly (re)connected session should ask to resume from.
pub struct Participant {
    pub name: String,
    pub secret: String,
    pub session: Option<Arc<dyn SessionHandle>>,
    pub next_seq: u64,
    pub history: Vec<Envelope>,
}

impl Participant {
    pub fn new(name: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            secret: secret.into(),
            session: None,
            next_seq: 0,
            history: Vec::new(),
        }
    }

    /// Write an envelope to this participant's live transport (if any),
    /// append it to history, and advance `next_seq`. A write failure (dead or
    /// absent socket) is swallowed: the entry is still retained for replay
    /// once the participant reattaches.
    pub fn push(&mut self, envelope: Envelope) {
        if let Some(session) = &self.session {
            let wrapper = OutboundWrapper::new(self.next_seq, &envelope);
            if let Ok(text) = serde_json::to_string(&wrapper) {
                let _ = session.send_text(&text);
            }
        }
        self.history.push(envelope);
        self.next_seq += 1;
    }

    /// Record that this participant itself sent `content` to `to`, without
    /// writing anything to the wire and without advancing `next_seq`. Shadow
    /// entries exist purely so a participant's own replay stream reflects
    /// what it sent, interleaved with what it received.
    pub fn push_shadow(&mut self, to: impl Into<String>, content: Value) {
        self.history.push(Envelope::Shadow {
            shadow: ShadowBody { to: to.into(), content },
        });
    }

    /// Entries this participant has not yet seen, starting from
    /// `expected_next` pushed (non-shadow) entries in.
    ///
    /// Walks history counting only non-shadow entries. The moment that count
    /// would reach `expected_next` for the *next* entry, the entry under
    /// consideration and everything after it is what's replayed; the break
    /// happens before that entry is counted or the caret advances past it.
    pub fn generate_replay(&self, expected_next: u64) -> Vec<Value> {
        let mut seen = 0u64;
        let mut caret = 0usize;
        for entry in &self.history {
            if seen == expected_next {
                break;
            }
            if !entry.is_shadow() {
                seen += 1;
            }
            caret += 1;
        }
        self.history[caret..]
            .iter()
            .filter_map(|entry| serde_json::to_value(entry).ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::StubSessionHandle;

    fn msg(from: &str, am: &str) -> Envelope {
        Envelope::Msg { from: from.into(), am: Value::String(am.into()) }
    }

    #[test]
    fn push_writes_wraps_with_current_seq_and_advances_it() {
        let handle = Arc::new(StubSessionHandle::new());
        let mut p = Participant::new("alice", "s1");
        p.session = Some(handle.clone());

        p.push(msg("bob", "hi"));
        p.push(msg("bob", "again"));

        let sent = handle.sent();
        assert_eq!(sent.len(), 2);
        let first: Value = serde_json::from_str(&sent[0]).unwrap();
        assert_eq!(first["q"], 0);
        let second: Value = serde_json::from_str(&sent[1]).unwrap();
        assert_eq!(second["q"], 1);
        assert_eq!(p.next_seq, 2);
    }

    #[test]
    fn shadow_entries_do_not_advance_next_seq_or_hit_the_wire() {
        let handle = Arc::new(StubSessionHandle::new());
        let mut p = Participant::new("alice", "s1");
        p.session = Some(handle.clone());

        p.push_shadow("all", Value::String("hi".into()));
        assert_eq!(p.next_seq, 0);
        assert!(handle.sent().is_empty());
        assert_eq!(p.history.len(), 1);
    }

    #[test]
    fn replay_from_zero_returns_everything() {
        let mut p = Participant::new("alice", "s1");
        p.push(msg("bob", "one"));
        p.push(msg("bob", "two"));
        let replay = p.generate_replay(0);
        assert_eq!(replay.len(), 2);
    }

    #[test]
    fn replay_skips_acknowledged_prefix_but_keeps_interleaved_shadows() {
        let mut p = Participant::new("alice", "s1");
        p.push(msg("bob", "one"));
        p.push_shadow("owner", Value::String("ack".into()));
        p.push(msg("bob", "two"));

        let replay = p.generate_replay(1);
        assert_eq!(replay.len(), 2);
        assert_eq!(replay[0]["type"], "shadow");
        assert_eq!(replay[1]["type"], "msg");
    }

    #[test]
    fn replay_from_current_seq_returns_nothing() {
        let mut p = Participant::new("alice", "s1");
        p.push(msg("bob", "one"));
        assert!(p.generate_replay(1).is_empty());
    }
}
