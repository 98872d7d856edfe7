// Route module decomposition, mirroring the teacher: shared request guards
// here, route functions in per-concern submodules.

mod rooms;
mod session;

pub use rooms::{close_server, create_server};
pub use session::connect;

use rocket::request::{FromRequest, Outcome, Request};

/// The only API version this relay understands. A connect or control-plane
/// request whose version path segment doesn't match this is rejected.
pub const API_VERSION: &str = "v0";

pub fn version_matches(version: &str) -> bool {
    version == API_VERSION
}

/// The remote address a request came from, preferring a forwarding proxy's
/// header over the raw peer address — mirrors the teacher's `ClientIp` guard.
pub struct ClientIp(pub String);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for ClientIp {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let ip = req
            .headers()
            .get_one("X-Forwarded-For")
            .and_then(|s| s.split(',').next())
            .map(|s| s.trim().to_string())
            .or_else(|| req.remote().map(|r| r.ip().to_string()))
            .unwrap_or_else(|| "unknown".to_string());
        Outcome::Success(ClientIp(ip))
    }
}
