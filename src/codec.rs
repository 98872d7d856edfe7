//! Outbound envelope kinds and the routing sentinel.
//!
//! The source conflated routing targets with a player's `name` field (integers
//! 1 and 2 for "owner" and "all"). Here routing is its own closed, tagged type
//! so a participant literally named "1" can never be mistaken for the owner.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where a message is headed: the owner, every participant (plus the owner,
/// plus the public log), or one named participant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Owner,
    All,
    Named(String),
}

impl Route {
    /// The identity string this route appears as on the wire (the `from` of a
    /// `msg`, or the `to` inside a shadow entry).
    pub fn wire_name(&self) -> String {
        match self {
            Route::Owner => "owner".to_string(),
            Route::All => "all".to_string(),
            Route::Named(name) => name.clone(),
        }
    }
}

/// The sender/recipient pair recorded inside a shadow entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShadowBody {
    pub to: String,
    pub content: Value,
}

/// The small closed set of envelope kinds the relay ever emits or retains.
///
/// Serialized with an internal `type` tag, independent of the outer
/// `{kind: "inbound", ...}` wrapper a pushed envelope travels in (see
/// [`OutboundWrapper`]). `Repeated` is written directly, untagged by that
/// wrapper, in response to a `repeat` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Envelope {
    #[serde(rename = "msg")]
    Msg { from: String, am: Value },
    #[serde(rename = "userappend")]
    UserAppend { user: String },
    #[serde(rename = "userjoin")]
    UserJoin { user: String },
    #[serde(rename = "userleft")]
    UserLeft { user: String },
    #[serde(rename = "su")]
    Su { su: String },
    #[serde(rename = "repeated")]
    Repeated { start: u64, repeat: Vec<Value> },
    #[serde(rename = "shadow")]
    Shadow { shadow: ShadowBody },
}

impl Envelope {
    pub fn is_shadow(&self) -> bool {
        matches!(self, Envelope::Shadow { .. })
    }
}

/// The wrapper every envelope actually written to a participant's transport
/// travels in. `q` is the participant's `next_seq` at the moment of emission.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundWrapper<'a> {
    pub kind: &'static str,
    pub q: u64,
    pub msg: &'a Envelope,
}

impl<'a> OutboundWrapper<'a> {
    pub fn new(q: u64, msg: &'a Envelope) -> Self {
        Self { kind: "inbound", q, msg }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn msg_envelope_serializes_with_type_tag() {
        let envelope = Envelope::Msg { from: "alice".into(), am: Value::String("hi".into()) };
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["type"], "msg");
        assert_eq!(json["from"], "alice");
        assert_eq!(json["am"], "hi");
    }

    #[test]
    fn wrapper_uses_kind_not_type() {
        let envelope = Envelope::Su { su: "secret".into() };
        let wrapper = OutboundWrapper::new(0, &envelope);
        let json = serde_json::to_value(&wrapper).unwrap();
        assert_eq!(json["kind"], "inbound");
        assert_eq!(json["q"], 0);
        assert_eq!(json["msg"]["type"], "su");
        assert_eq!(json["msg"]["su"], "secret");
    }

    #[test]
    fn route_wire_names_cover_sentinels_and_named() {
        assert_eq!(Route::Owner.wire_name(), "owner");
        assert_eq!(Route::All.wire_name(), "all");
        assert_eq!(Route::Named("1".into()).wire_name(), "1");
    }
}
