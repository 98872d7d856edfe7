//! Control-plane HTTP surface: `createServer` / `closeServer`, version
//! prefix enforcement, and status/body shaping per the external interface.

use std::sync::Arc;

use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{delete, post, State};
use serde_json::{json, Value};

use crate::control::{CloseRoomError, CreateRoomError};
use crate::state::AppState;

use super::{version_matches, ClientIp};

fn version_incompatible() -> (Status, Json<Value>) {
    (Status::BadRequest, Json(json!({"error": "version incompatible"})))
}

#[post("/<version>/createServer?<limit>&<prefix>")]
pub fn create_server(
    version: &str,
    limit: Option<i64>,
    prefix: Option<&str>,
    ip: ClientIp,
    state: &State<Arc<AppState>>,
) -> (Status, Json<Value>) {
    if !version_matches(version) {
        return version_incompatible();
    }

    let plane = state.control_plane();
    match plane.create_room(prefix.unwrap_or(""), limit.unwrap_or(-1), &ip.0) {
        Ok(created) => {
            let tail = &created.code[created.code.len().saturating_sub(4)..];
            (Status::Created, Json(json!({"c": tail, "su": created.owner_secret})))
        }
        Err(CreateRoomError::OwnershipCapReached) => {
            (Status::Forbidden, Json(json!({"error": "limit reached"})))
        }
        Err(CreateRoomError::CodeAllocationExhausted) => (
            Status::InternalServerError,
            Json(json!({"error": "could not allocate a room code"})),
        ),
    }
}

#[delete("/<version>/closeServer?<code>&<su>")]
pub fn close_server(version: &str, code: &str, su: &str, state: &State<Arc<AppState>>) -> (Status, Json<Value>) {
    if !version_matches(version) {
        return version_incompatible();
    }

    let plane = state.control_plane();
    match plane.close_room(code, su) {
        Ok(()) => (Status::Ok, Json(json!({}))),
        Err(CloseRoomError::NotFound) => (Status::NotFound, Json(json!({"error": "no room with that code"}))),
        Err(CloseRoomError::Unauthorized) => {
            (Status::Unauthorized, Json(json!({"error": "owner secret does not match"})))
        }
    }
}
