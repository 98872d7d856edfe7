use rocket::http::Status;

use room_relay::config::{JoinRateLimitConfig, RelayConfig};

use crate::common::{create_test_room, test_client, test_client_with_config};

#[test]
fn create_room_returns_a_four_letter_code_and_owner_secret() {
    let client = test_client();
    let res = client.post("/v0/createServer").dispatch();
    assert_eq!(res.status(), Status::Created);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["c"].as_str().unwrap().len(), 4);
    assert!(!body["su"].as_str().unwrap().is_empty());
}

#[test]
fn create_room_honors_a_custom_prefix() {
    let client = test_client();
    let res = client.post("/v0/createServer?prefix=ZZ").dispatch();
    assert_eq!(res.status(), Status::Created);
    let body: serde_json::Value = res.into_json().unwrap();
    // the response only ever carries the last 4 letters, the prefix is implicit
    assert_eq!(body["c"].as_str().unwrap().len(), 4);
}

#[test]
fn create_room_rejects_once_the_ownership_cap_is_reached() {
    let client = test_client();
    for _ in 0..3 {
        let res = client.post("/v0/createServer").dispatch();
        assert_eq!(res.status(), Status::Created);
    }

    let res = client.post("/v0/createServer").dispatch();
    assert_eq!(res.status(), Status::Forbidden);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["error"], "limit reached");
}

#[test]
fn close_room_succeeds_with_the_matching_owner_secret() {
    let client = test_client();
    let (code, su) = create_test_room(&client);

    let res = client.delete(format!("/v0/closeServer?code={code}&su={su}")).dispatch();
    assert_eq!(res.status(), Status::Ok);
}

#[test]
fn close_room_rejects_a_mismatched_owner_secret() {
    let client = test_client();
    let (code, _su) = create_test_room(&client);

    let res = client.delete(format!("/v0/closeServer?code={code}&su=wrong")).dispatch();
    assert_eq!(res.status(), Status::Unauthorized);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["error"], "owner secret does not match");
}

#[test]
fn close_room_reports_not_found_for_an_unknown_code() {
    let client = test_client();
    let res = client.delete("/v0/closeServer?code=ZZZZ&su=whatever").dispatch();
    assert_eq!(res.status(), Status::NotFound);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["error"], "no room with that code");
}

#[test]
fn closed_room_can_no_longer_be_closed_a_second_time() {
    let client = test_client();
    let (code, su) = create_test_room(&client);
    client.delete(format!("/v0/closeServer?code={code}&su={su}")).dispatch();

    let res = client.delete(format!("/v0/closeServer?code={code}&su={su}")).dispatch();
    assert_eq!(res.status(), Status::NotFound);
}

#[test]
fn mismatched_version_prefix_is_rejected_before_the_handler_runs() {
    let client = test_client();
    let res = client.post("/v1/createServer").dispatch();
    assert_eq!(res.status(), Status::BadRequest);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["error"], "version incompatible");

    let res = client.delete("/v1/closeServer?code=ZZZZ&su=x").dispatch();
    assert_eq!(res.status(), Status::BadRequest);
}

#[test]
fn a_freed_room_code_can_be_reused_by_a_later_create() {
    let client = test_client();
    let (code, su) = create_test_room(&client);
    client.delete(format!("/v0/closeServer?code={code}&su={su}")).dispatch();

    // Closing frees the room's ownership slot, so the same address can
    // create up to the cap again afterward.
    for _ in 0..3 {
        let res = client.post("/v0/createServer").dispatch();
        assert_eq!(res.status(), Status::Created);
    }
}

#[test]
fn custom_join_rate_limit_config_is_honored_by_the_managed_registry() {
    let mut config = RelayConfig::default();
    config.join_rate_limit = JoinRateLimitConfig { max_users: 1, per_n_seconds: 60, ban_for: 60 };
    let client = test_client_with_config(config);

    let res = client.post("/v0/createServer").dispatch();
    assert_eq!(res.status(), Status::Created);
}
