pub mod close_cause;
pub mod codec;
pub mod config;
pub mod control;
pub mod participant;
pub mod rate_limit;
pub mod registry;
pub mod room;
mod routes;
pub mod session;
pub mod state;
pub mod transport;

use std::sync::Arc;

use rocket_cors::{AllowedMethods, CorsOptions};

use config::RelayConfig;
use state::AppState;

/// Build the Rocket instance with configuration read from the environment
/// (see [`config::RelayConfig::from_env`]).
pub fn rocket() -> rocket::Rocket<rocket::Build> {
    rocket_with_config(RelayConfig::from_env())
}

/// Build the Rocket instance with an explicit configuration, bypassing the
/// environment. Exists so tests can exercise rate-limit tunables
/// deterministically without racing on process env vars.
pub fn rocket_with_config(config: RelayConfig) -> rocket::Rocket<rocket::Build> {
    let port = config.port;
    let app_state = Arc::new(AppState::new(config));

    let allowed_methods: AllowedMethods = ["Post", "Delete"]
        .iter()
        .map(|s| std::str::FromStr::from_str(s).unwrap())
        .collect();

    let cors = CorsOptions::default()
        .allowed_methods(allowed_methods)
        .to_cors()
        .expect("failed to build CORS options");

    let figment = rocket::Config::figment().merge(("port", port));

    rocket::custom(figment)
        .manage(app_state)
        .attach(cors)
        .mount(
            "/",
            rocket::routes![routes::create_server, routes::close_server, routes::connect],
        )
}
