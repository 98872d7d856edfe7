//! Process-wide managed state: the registry, the ownership counter, and
//! configuration, bundled so `lib.rs` can hand a single `&State<AppState>`
//! to every route.

use crate::config::RelayConfig;
use crate::control::ControlPlane;
use crate::rate_limit::OwnershipCounter;
use crate::registry::Registry;

pub struct AppState {
    pub registry: Registry,
    pub ownership: OwnershipCounter,
    pub config: RelayConfig,
}

impl AppState {
    pub fn new(config: RelayConfig) -> Self {
        Self { registry: Registry::new(), ownership: OwnershipCounter::new(), config }
    }

    pub fn control_plane(&self) -> ControlPlane<'_> {
        ControlPlane::new(&self.registry, &self.ownership, self.config.join_rate_limit)
    }
}
