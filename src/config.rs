//! Environment-driven configuration, grounded on the teacher's
//! `RateLimitConfig::from_env` (individual `env::var` + `parse`, falling back
//! to the reference service's own defaults when unset or unparsable).

use std::env;

/// Tunables for the per-room join rate limiter (see [`crate::rate_limit`]).
#[derive(Debug, Clone, Copy)]
pub struct JoinRateLimitConfig {
    pub max_users: u32,
    pub per_n_seconds: u64,
    pub ban_for: u64,
}

impl Default for JoinRateLimitConfig {
    fn default() -> Self {
        Self { max_users: 3, per_n_seconds: 1, ban_for: 200 }
    }
}

/// Process-wide configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub port: u16,
    pub join_rate_limit: JoinRateLimitConfig,
    /// The admin inspector surface is out of scope (see DESIGN.md); this flag
    /// is threaded through so a future inspector could gate on it, but no
    /// handler is mounted regardless of its value.
    pub inspector_enabled: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self { port: 8000, join_rate_limit: JoinRateLimitConfig::default(), inspector_enabled: false }
    }
}

impl RelayConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = env::var("ROCKET_PORT")
            && let Ok(n) = val.parse::<u16>()
        {
            config.port = n;
        }
        if let Ok(val) = env::var("RATE_LIMIT_MAX_USERS")
            && let Ok(n) = val.parse::<u32>()
        {
            config.join_rate_limit.max_users = n;
        }
        if let Ok(val) = env::var("RATE_LIMIT_PER_N_SECONDS")
            && let Ok(n) = val.parse::<u64>()
        {
            config.join_rate_limit.per_n_seconds = n;
        }
        if let Ok(val) = env::var("RATE_LIMIT_BAN_FOR")
            && let Ok(n) = val.parse::<u64>()
        {
            config.join_rate_limit.ban_for = n;
        }
        if let Ok(val) = env::var("INSPECTOR_ENABLED") {
            config.inspector_enabled = val != "0" && val.to_lowercase() != "false";
        }

        config
    }
}
