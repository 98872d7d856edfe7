// Integration test suite for the room relay's control-plane HTTP surface.
// Session transport (the WebSocket endpoint) is thin glue over the fully
// unit-tested session state machine in `room_relay::session` and isn't
// re-verified here.

mod common;
mod rooms;
