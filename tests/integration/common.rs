use rocket::local::blocking::Client;

use room_relay::config::RelayConfig;

pub fn test_client() -> Client {
    let rocket = room_relay::rocket_with_config(RelayConfig::default());
    Client::tracked(rocket).expect("valid rocket instance")
}

/// A client built from a custom configuration, for exercising join-rate-limit
/// tunables without racing on process env vars.
pub fn test_client_with_config(config: RelayConfig) -> Client {
    let rocket = room_relay::rocket_with_config(config);
    Client::tracked(rocket).expect("valid rocket instance")
}

/// Create a room and return (code, owner_secret).
pub fn create_test_room(client: &Client) -> (String, String) {
    use rocket::http::Status;
    let res = client.post("/v0/createServer").dispatch();
    assert_eq!(res.status(), Status::Created);
    let body: serde_json::Value = res.into_json().unwrap();
    (body["c"].as_str().unwrap().to_string(), body["su"].as_str().unwrap().to_string())
}
