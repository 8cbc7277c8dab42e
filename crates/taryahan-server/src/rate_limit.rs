// crates/taryahan-server/src/rate_limit.rs
// ============================================================================
// Module: Enquiry Rate Limiter
// Description: Per-IP attempt counter with a separate block window.
// Purpose: Gate public enquiry submissions without an external cache.
// Dependencies: taryahan-config
// ============================================================================

//! ## Overview
//! Each client IP owns one entry keyed `partner_enquiry:<ip>`. An entry holds
//! an attempt counter whose expiry is refreshed on every counted attempt and
//! an optional block deadline. Once the counter has reached the limit the
//! next attempt sets the block and is rejected; every attempt while blocked
//! is rejected even if the counter itself has expired.
//!
//! The whole check-and-increment runs under one mutex, so concurrent
//! requests from the same IP can never be admitted beyond the limit.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

use taryahan_config::EnquiryRateLimitConfig;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Prefix for limiter keys.
const KEY_PREFIX: &str = "partner_enquiry";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Limiter thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Attempts admitted before the client is blocked.
    pub max_attempts: u32,
    /// Counter expiry, refreshed on every counted attempt.
    pub window: Duration,
    /// Block duration.
    pub block: Duration,
    /// Maximum number of tracked clients.
    pub max_entries: usize,
}

impl From<&EnquiryRateLimitConfig> for RateLimitPolicy {
    fn from(config: &EnquiryRateLimitConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            window: config.window(),
            block: config.block(),
            max_entries: config.max_entries,
        }
    }
}

/// Outcome of one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// The attempt is admitted; `attempts` counts it.
    Allowed {
        /// Attempts counted in the current window, including this one.
        attempts: u32,
    },
    /// The attempt is rejected.
    Blocked {
        /// Time until the block lifts.
        retry_after: Duration,
    },
}

impl RateLimitDecision {
    /// Returns true when the attempt was admitted.
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

/// Per-client limiter state.
#[derive(Debug, Clone, Copy)]
struct Entry {
    /// Attempts counted since the counter last expired.
    attempts: u32,
    /// Counter expiry.
    attempts_expire_at: Instant,
    /// Block deadline when blocked.
    blocked_until: Option<Instant>,
    /// Last time the entry was touched.
    last_seen: Instant,
}

impl Entry {
    /// Returns true when neither the counter nor the block is live.
    fn is_stale(&self, now: Instant) -> bool {
        self.attempts_expire_at <= now && self.blocked_until.is_none_or(|until| until <= now)
    }
}

// ============================================================================
// SECTION: Limiter
// ============================================================================

/// IP-keyed limiter for the public enquiry form.
#[derive(Debug)]
pub struct EnquiryRateLimiter {
    /// Thresholds.
    policy: RateLimitPolicy,
    /// Tracked clients.
    entries: Mutex<HashMap<String, Entry>>,
}

impl EnquiryRateLimiter {
    /// Builds a limiter with the given thresholds.
    #[must_use]
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self { policy, entries: Mutex::new(HashMap::new()) }
    }

    /// Returns the limiter key for a client IP.
    #[must_use]
    pub fn key_for(ip: IpAddr) -> String {
        format!("{KEY_PREFIX}:{ip}")
    }

    /// Counts one attempt from `ip` now.
    pub fn check(&self, ip: IpAddr) -> RateLimitDecision {
        self.check_at(&Self::key_for(ip), Instant::now())
    }

    /// Counts one attempt for `key` at `now`.
    pub fn check_at(&self, key: &str, now: Instant) -> RateLimitDecision {
        let Ok(mut entries) = self.entries.lock() else {
            // A poisoned table fails closed.
            return RateLimitDecision::Blocked { retry_after: self.policy.block };
        };
        if !entries.contains_key(key) {
            entries.retain(|_, entry| !entry.is_stale(now));
            if entries.len() >= self.policy.max_entries {
                evict_oldest(&mut entries);
            }
        }
        let entry = entries.entry(key.to_string()).or_insert(Entry {
            attempts: 0,
            attempts_expire_at: now,
            blocked_until: None,
            last_seen: now,
        });
        entry.last_seen = now;
        if let Some(until) = entry.blocked_until {
            if until > now {
                return RateLimitDecision::Blocked { retry_after: until - now };
            }
            entry.blocked_until = None;
        }
        if entry.attempts_expire_at <= now {
            entry.attempts = 0;
        }
        if entry.attempts >= self.policy.max_attempts {
            entry.blocked_until = Some(now + self.policy.block);
            return RateLimitDecision::Blocked { retry_after: self.policy.block };
        }
        entry.attempts += 1;
        entry.attempts_expire_at = now + self.policy.window;
        RateLimitDecision::Allowed { attempts: entry.attempts }
    }

    /// Returns the number of tracked clients.
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.entries.lock().map_or(0, |entries| entries.len())
    }
}

/// Drops the least recently seen entry.
fn evict_oldest(entries: &mut HashMap<String, Entry>) {
    let oldest =
        entries.iter().min_by_key(|(_, entry)| entry.last_seen).map(|(key, _)| key.clone());
    if let Some(key) = oldest {
        entries.remove(&key);
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::net::IpAddr;
    use std::net::Ipv4Addr;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;
    use std::time::Instant;

    use proptest::prelude::*;

    use super::EnquiryRateLimiter;
    use super::RateLimitDecision;
    use super::RateLimitPolicy;

    const MINUTE: Duration = Duration::from_secs(60);

    fn policy(max_entries: usize) -> RateLimitPolicy {
        RateLimitPolicy { max_attempts: 5, window: MINUTE * 15, block: MINUTE * 15, max_entries }
    }

    #[test]
    fn sixth_attempt_is_blocked_then_released() {
        let limiter = EnquiryRateLimiter::new(policy(16));
        let start = Instant::now();
        for n in 1 ..= 5 {
            assert_eq!(
                limiter.check_at("partner_enquiry:10.0.0.1", start),
                RateLimitDecision::Allowed { attempts: n }
            );
        }
        assert!(!limiter.check_at("partner_enquiry:10.0.0.1", start).is_allowed());
        assert!(!limiter.check_at("partner_enquiry:10.0.0.1", start + MINUTE * 14).is_allowed());
        assert!(limiter.check_at("partner_enquiry:10.0.0.1", start + MINUTE * 16).is_allowed());
    }

    #[test]
    fn block_outlives_expired_counter() {
        let limiter = EnquiryRateLimiter::new(RateLimitPolicy {
            window: MINUTE,
            ..policy(16)
        });
        let start = Instant::now();
        for _ in 0 .. 5 {
            limiter.check_at("k", start);
        }
        assert!(!limiter.check_at("k", start).is_allowed());
        assert!(!limiter.check_at("k", start + MINUTE * 2).is_allowed());
    }

    #[test]
    fn counter_expiry_is_refreshed_by_each_attempt() {
        let limiter = EnquiryRateLimiter::new(policy(16));
        let start = Instant::now();
        for n in 0_u32 .. 5 {
            assert!(limiter.check_at("k", start + MINUTE * (n * 10)).is_allowed());
        }
        assert!(!limiter.check_at("k", start + MINUTE * 41).is_allowed());
    }

    #[test]
    fn distinct_ips_are_independent() {
        let limiter = EnquiryRateLimiter::new(policy(16));
        let a = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        let b = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));
        for _ in 0 .. 6 {
            limiter.check(a);
        }
        assert!(!limiter.check(a).is_allowed());
        assert!(limiter.check(b).is_allowed());
        assert_eq!(EnquiryRateLimiter::key_for(a), "partner_enquiry:10.0.0.1");
    }

    #[test]
    fn table_is_capped_by_evicting_oldest() {
        let limiter = EnquiryRateLimiter::new(policy(2));
        let start = Instant::now();
        limiter.check_at("a", start);
        limiter.check_at("b", start + MINUTE);
        limiter.check_at("c", start + MINUTE * 2);
        assert_eq!(limiter.tracked(), 2);
        assert_eq!(limiter.check_at("a", start + MINUTE * 3), RateLimitDecision::Allowed {
            attempts: 1
        });
    }

    #[test]
    fn concurrent_attempts_never_exceed_limit() {
        let limiter = Arc::new(EnquiryRateLimiter::new(policy(16)));
        let ip = IpAddr::V4(Ipv4Addr::LOCALHOST);
        let handles: Vec<_> = (0 .. 16)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                thread::spawn(move || limiter.check(ip).is_allowed())
            })
            .collect();
        let admitted =
            handles.into_iter().filter_map(|handle| handle.join().ok()).filter(|ok| *ok).count();
        assert_eq!(admitted, 5);
    }

    proptest! {
        #[test]
        fn admitted_attempts_within_window_never_exceed_limit(
            offsets in prop::collection::vec(0_u64 .. 900, 1 .. 40),
        ) {
            let limiter = EnquiryRateLimiter::new(policy(16));
            let start = Instant::now();
            let mut sorted = offsets;
            sorted.sort_unstable();
            let admitted = sorted
                .iter()
                .filter(|secs| {
                    limiter.check_at("k", start + Duration::from_secs(**secs)).is_allowed()
                })
                .count();
            prop_assert!(admitted <= 5);
        }
    }
}
