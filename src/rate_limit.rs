//! # Rate Limiter Module
//!
//! ## Purpose
//! Fixed-window request counting keyed by an arbitrary string (typically
//! `<action>:<client-identifier>`), guarding the authentication and
//! lead-submission endpoints from abuse.
//!
//! ## Algorithm
//! No entry, or the window has elapsed: start a fresh window with count 1 and
//! allow. Count at the limit: deny with a retry-after hint. Otherwise
//! increment and allow. Expired entries are swept opportunistically once the
//! map grows past a threshold, keeping memory bounded.

use actix_web::HttpRequest;
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Sweep expired windows once the map holds this many keys.
const SWEEP_THRESHOLD: usize = 1024;

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Requests left in the current window
    pub remaining: u32,
    /// Seconds until the window resets (at least 1)
    pub retry_after_secs: u64,
}

struct WindowEntry {
    count: u32,
    reset_at: Instant,
}

/// Shared fixed-window counter.
pub struct RateLimiter {
    windows: DashMap<String, WindowEntry>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            windows: DashMap::new(),
        }
    }

    /// Check and count one request for `key` under `max` per `window`.
    pub fn check(&self, key: &str, max: u32, window: Duration) -> RateLimitDecision {
        self.check_at(key, max, window, Instant::now())
    }

    fn check_at(&self, key: &str, max: u32, window: Duration, now: Instant) -> RateLimitDecision {
        if self.windows.len() > SWEEP_THRESHOLD {
            self.windows.retain(|_, entry| entry.reset_at > now);
        }

        let mut entry = self.windows.entry(key.to_string()).or_insert_with(|| WindowEntry {
            count: 0,
            reset_at: now + window,
        });

        // A stale entry means the window elapsed: start fresh.
        if entry.reset_at <= now {
            entry.count = 0;
            entry.reset_at = now + window;
        }

        let retry_after_secs = entry
            .reset_at
            .saturating_duration_since(now)
            .as_secs()
            .max(1);

        if entry.count >= max {
            return RateLimitDecision {
                allowed: false,
                remaining: 0,
                retry_after_secs,
            };
        }

        entry.count += 1;
        RateLimitDecision {
            allowed: true,
            remaining: max.saturating_sub(entry.count),
            retry_after_secs,
        }
    }

    /// Number of tracked windows (including expired ones not yet swept).
    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }
}

/// Identify the client behind a request: first hop of `x-forwarded-for`,
/// then `x-real-ip`, else a shared "unknown" bucket. Coarse by design --
/// unidentifiable clients throttle together.
pub fn client_identifier(request: &HttpRequest) -> String {
    if let Some(forwarded) = header_str(request, "x-forwarded-for") {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }
    if let Some(real_ip) = header_str(request, "x-real-ip") {
        if !real_ip.is_empty() {
            return real_ip.to_string();
        }
    }
    "unknown".to_string()
}

fn header_str<'a>(request: &'a HttpRequest, name: &str) -> Option<&'a str> {
    request.headers().get(name)?.to_str().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    const WINDOW: Duration = Duration::from_secs(60);

    #[test]
    fn allows_up_to_max_then_denies() {
        let limiter = RateLimiter::new();
        let now = Instant::now();
        for i in 0..5 {
            let decision = limiter.check_at("login:1.2.3.4", 5, WINDOW, now);
            assert!(decision.allowed, "call {} should be allowed", i + 1);
            assert_eq!(decision.remaining, 4 - i);
        }
        let denied = limiter.check_at("login:1.2.3.4", 5, WINDOW, now);
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, 0);
        assert!(denied.retry_after_secs >= 1);
    }

    #[test]
    fn window_elapse_resets_the_counter() {
        let limiter = RateLimiter::new();
        let start = Instant::now();
        for _ in 0..3 {
            limiter.check_at("k", 3, WINDOW, start);
        }
        assert!(!limiter.check_at("k", 3, WINDOW, start).allowed);

        let later = start + WINDOW + Duration::from_secs(1);
        let fresh = limiter.check_at("k", 3, WINDOW, later);
        assert!(fresh.allowed);
        assert_eq!(fresh.remaining, 2); // counter restarted at 1
    }

    #[test]
    fn keys_are_independent() {
        let limiter = RateLimiter::new();
        let now = Instant::now();
        assert!(limiter.check_at("a", 1, WINDOW, now).allowed);
        assert!(!limiter.check_at("a", 1, WINDOW, now).allowed);
        assert!(limiter.check_at("b", 1, WINDOW, now).allowed);
    }

    #[test]
    fn sweep_drops_expired_windows() {
        let limiter = RateLimiter::new();
        let start = Instant::now();
        for i in 0..=SWEEP_THRESHOLD {
            limiter.check_at(&format!("k{}", i), 1, Duration::from_secs(1), start);
        }
        assert!(limiter.tracked_keys() > SWEEP_THRESHOLD);

        // All previous windows have elapsed; the next check sweeps them.
        let later = start + Duration::from_secs(2);
        limiter.check_at("fresh", 1, WINDOW, later);
        assert!(limiter.tracked_keys() <= 2);
    }

    #[test]
    fn client_identification_falls_through_headers() {
        let req = TestRequest::default()
            .insert_header(("x-forwarded-for", "10.0.0.1, 172.16.0.1"))
            .to_http_request();
        assert_eq!(client_identifier(&req), "10.0.0.1");

        let req = TestRequest::default()
            .insert_header(("x-real-ip", "10.0.0.2"))
            .to_http_request();
        assert_eq!(client_identifier(&req), "10.0.0.2");

        let req = TestRequest::default().to_http_request();
        assert_eq!(client_identifier(&req), "unknown");
    }
}
