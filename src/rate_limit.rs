//! Abuse controls: per-address join strikes/bans, and per-owner-address room
//! ownership counts.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Per-address bookkeeping for the join rate limiter.
///
/// `window_start` seeded far enough in the past that the very first join
/// attempt from a fresh address always resets the window rather than
/// registering an immediate strike — `Instant` has no absolute zero to mean
/// "never struck," so a deliberately stale timestamp stands in for it.
pub struct JoinLimiterEntry {
    pub strikes: u32,
    pub window_start: Instant,
    pub banned_until: Option<Instant>,
}

impl JoinLimiterEntry {
    pub fn initial() -> Self {
        Self {
            strikes: 0,
            window_start: Instant::now() - Duration::from_secs(86_400),
            banned_until: None,
        }
    }
}

/// How many rooms are currently owned by a given remote address, so the
/// control plane can enforce the per-owner cap.
pub struct OwnershipCounter {
    counts: Mutex<HashMap<String, u32>>,
}

impl Default for OwnershipCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl OwnershipCounter {
    pub fn new() -> Self {
        Self { counts: Mutex::new(HashMap::new()) }
    }

    pub fn count_for(&self, address: &str) -> u32 {
        *self.counts.lock().unwrap().get(address).unwrap_or(&0)
    }

    pub fn increment(&self, address: &str) {
        *self.counts.lock().unwrap().entry(address.to_string()).or_insert(0) += 1;
    }

    /// Mirrors the source's `ip_deown`: an address with no rooms left has no
    /// entry at all, rather than a lingering zero.
    pub fn decrement(&self, address: &str) {
        let mut counts = self.counts.lock().unwrap();
        if let Some(count) = counts.get_mut(address) {
            if *count <= 1 {
                counts.remove(address);
            } else {
                *count -= 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ownership_counter_tracks_increments_and_decrements() {
        let counter = OwnershipCounter::new();
        assert_eq!(counter.count_for("1.2.3.4"), 0);
        counter.increment("1.2.3.4");
        counter.increment("1.2.3.4");
        assert_eq!(counter.count_for("1.2.3.4"), 2);
        counter.decrement("1.2.3.4");
        assert_eq!(counter.count_for("1.2.3.4"), 1);
    }

    #[test]
    fn ownership_counter_removes_entry_at_zero() {
        let counter = OwnershipCounter::new();
        counter.increment("1.2.3.4");
        counter.decrement("1.2.3.4");
        assert_eq!(counter.count_for("1.2.3.4"), 0);
        assert!(!counter.counts.lock().unwrap().contains_key("1.2.3.4"));
    }

    #[test]
    fn fresh_join_limiter_entry_does_not_immediately_strike() {
        let entry = JoinLimiterEntry::initial();
        assert_eq!(entry.strikes, 0);
        assert!(entry.banned_until.is_none());
        assert!(Instant::now().duration_since(entry.window_start) > Duration::from_secs(1));
    }
}
