// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Sliding-window rate limiter for the submission endpoint.
//!
//! Each identifier owns an ordered list of request timestamps (milliseconds
//! since the epoch). Timestamps older than the window are pruned lazily on
//! every check. The store is bounded: identifiers idle for longer than the
//! configured TTL are forgotten, and when the identifier cap is reached the
//! least recently used entry is evicted.
//!
//! The check-and-append for an identifier happens under a single write lock,
//! so concurrent requests for the same identifier cannot both be admitted on
//! a stale count.

use crate::config::RateLimitConfig;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// Result of a rate limit check.
#[derive(Debug, Clone)]
pub enum RateLimitResult {
    /// Request is allowed
    Allowed {
        /// Remaining requests in current window
        remaining: u32,
        /// Time until the oldest counted request leaves the window
        reset_in: Duration,
    },
    /// Request is rate limited
    Limited {
        /// Time until a request will be admitted again
        retry_after: Duration,
    },
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

/// Read-only view of an identifier's allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitInfo {
    /// Requests still admitted in the current window
    pub remaining: u32,
    /// Epoch milliseconds at which the oldest counted request ages out
    pub reset_at: i64,
    /// Configured limit
    pub limit: u32,
}

/// Request timestamps for one identifier.
#[derive(Debug, Default)]
struct RateWindow {
    /// Ascending request timestamps in epoch milliseconds
    timestamps: Vec<i64>,
    /// Last time this identifier was looked up
    last_access: i64,
}

impl RateWindow {
    /// Drop timestamps at or before `now - window_ms`.
    fn prune(&mut self, now: i64, window_ms: i64) {
        let cutoff = now - window_ms;
        self.timestamps.retain(|&t| t > cutoff);
    }

    fn info(&self, now: i64, limit: u32, window_ms: i64) -> RateLimitInfo {
        let cutoff = now - window_ms;
        let mut active = self.timestamps.iter().filter(|&&t| t > cutoff);
        let oldest = active.next().copied();
        let count = oldest.map(|_| 1 + active.count()).unwrap_or(0);

        RateLimitInfo {
            remaining: limit.saturating_sub(count as u32),
            reset_at: oldest.unwrap_or(now) + window_ms,
            limit,
        }
    }
}

/// Thread-safe sliding-window rate limiter.
pub struct RateLimiter {
    /// Configuration
    config: RateLimitConfig,
    /// Per-identifier windows
    windows: Arc<RwLock<HashMap<String, RateWindow>>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given configuration.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Record a request for `identifier` if fewer than `limit` requests fall
    /// inside the trailing `window_ms`. Denied attempts are not recorded.
    pub async fn allow(&self, identifier: &str, limit: u32, window_ms: u64) -> bool {
        self.admit_at(identifier, limit, window_ms, now_ms()).await.0
    }

    /// Remaining allowance for `identifier` without recording anything.
    pub async fn info(&self, identifier: &str, limit: u32, window_ms: u64) -> RateLimitInfo {
        self.info_at(identifier, limit, window_ms, now_ms()).await
    }

    /// Check `identifier` against the configured limit and window.
    pub async fn check(&self, identifier: &str) -> RateLimitResult {
        let now = now_ms();
        let (allowed, info) = self
            .admit_at(identifier, self.config.max_requests, self.config.window_ms, now)
            .await;
        let until_reset = Duration::from_millis((info.reset_at - now).max(0) as u64);

        if allowed {
            RateLimitResult::Allowed {
                remaining: info.remaining,
                reset_in: until_reset,
            }
        } else {
            debug!(identifier, retry_after = ?until_reset, "Submission rate limit exceeded");
            RateLimitResult::Limited {
                retry_after: until_reset,
            }
        }
    }

    /// Allowance for `identifier` under the configured limit and window.
    pub async fn check_info(&self, identifier: &str) -> RateLimitInfo {
        self.info(identifier, self.config.max_requests, self.config.window_ms)
            .await
    }

    /// Number of identifiers currently tracked.
    pub async fn tracked_identifiers(&self) -> usize {
        self.windows.read().await.len()
    }

    /// Clean up idle entries (should be called periodically).
    pub async fn cleanup(&self) {
        self.cleanup_at(now_ms()).await;
    }

    pub(crate) async fn admit_at(
        &self,
        identifier: &str,
        limit: u32,
        window_ms: u64,
        now: i64,
    ) -> (bool, RateLimitInfo) {
        let window_ms = window_ms as i64;
        let mut windows = self.windows.write().await;

        let idle = windows
            .get(identifier)
            .is_some_and(|w| self.is_idle(w, now));
        if idle {
            windows.remove(identifier);
        }
        if !windows.contains_key(identifier) {
            self.make_room(&mut windows, now);
        }

        let window = windows.entry(identifier.to_string()).or_default();
        window.last_access = now;
        window.prune(now, window_ms);

        if window.timestamps.len() >= limit as usize {
            return (false, window.info(now, limit, window_ms));
        }

        window.timestamps.push(now);
        (true, window.info(now, limit, window_ms))
    }

    pub(crate) async fn info_at(
        &self,
        identifier: &str,
        limit: u32,
        window_ms: u64,
        now: i64,
    ) -> RateLimitInfo {
        let window_ms = window_ms as i64;
        let windows = self.windows.read().await;

        match windows.get(identifier) {
            Some(window) if !self.is_idle(window, now) => window.info(now, limit, window_ms),
            _ => RateWindow::default().info(now, limit, window_ms),
        }
    }

    pub(crate) async fn cleanup_at(&self, now: i64) {
        let mut windows = self.windows.write().await;
        let before = windows.len();
        windows.retain(|_, window| !self.is_idle(window, now));
        let removed = before - windows.len();
        if removed > 0 {
            debug!(removed, remaining = windows.len(), "Evicted idle rate limit entries");
        }
    }

    fn is_idle(&self, window: &RateWindow, now: i64) -> bool {
        now - window.last_access >= self.config.idle_ttl().as_millis() as i64
    }

    /// Ensure there is space for one more identifier.
    fn make_room(&self, windows: &mut HashMap<String, RateWindow>, now: i64) {
        let cap = self.config.max_identifiers.max(1);
        if windows.len() < cap {
            return;
        }

        windows.retain(|_, window| !self.is_idle(window, now));

        while windows.len() >= cap {
            let lru = windows
                .iter()
                .min_by_key(|(_, window)| window.last_access)
                .map(|(key, _)| key.clone());
            match lru {
                Some(key) => {
                    debug!(identifier = %key, "Evicting least recently used rate limit entry");
                    windows.remove(&key);
                }
                None => break,
            }
        }
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: u64 = 60_000;

    fn limiter() -> RateLimiter {
        RateLimiter::new(RateLimitConfig::default())
    }

    #[tokio::test]
    async fn test_limit_plus_one_is_denied() {
        let limiter = limiter();
        let t0 = 1_000_000;

        for i in 0..10 {
            let (allowed, _) = limiter.admit_at("ip-1", 10, WINDOW, t0 + i).await;
            assert!(allowed, "request {} should be allowed", i + 1);
        }

        let (allowed, info) = limiter.admit_at("ip-1", 10, WINDOW, t0 + 10).await;
        assert!(!allowed);
        assert_eq!(info.remaining, 0);
        assert_eq!(info.reset_at, t0 + WINDOW as i64);
    }

    #[tokio::test]
    async fn test_denied_attempts_are_not_recorded() {
        let limiter = limiter();
        let t0 = 5_000_000;

        assert!(limiter.admit_at("ip", 1, WINDOW, t0).await.0);
        for offset in 1..5 {
            assert!(!limiter.admit_at("ip", 1, WINDOW, t0 + offset * 1000).await.0);
        }

        // Only the first request counts, so the allowance returns exactly one
        // window after it.
        assert!(limiter.admit_at("ip", 1, WINDOW, t0 + WINDOW as i64 + 1).await.0);
    }

    #[tokio::test]
    async fn test_allowance_resets_after_window() {
        let limiter = limiter();
        let t0 = 2_000_000;

        for i in 0..3 {
            assert!(limiter.admit_at("ip", 3, WINDOW, t0 + i).await.0);
        }
        assert!(!limiter.admit_at("ip", 3, WINDOW, t0 + 30_000).await.0);

        let later = t0 + WINDOW as i64 + 10;
        let info = limiter.info_at("ip", 3, WINDOW, later).await;
        assert_eq!(info.remaining, 3);
        assert!(limiter.admit_at("ip", 3, WINDOW, later).await.0);
    }

    #[tokio::test]
    async fn test_window_slides_rather_than_resetting_in_buckets() {
        let limiter = limiter();
        let t0 = 3_000_000;

        assert!(limiter.admit_at("ip", 2, WINDOW, t0).await.0);
        assert!(limiter.admit_at("ip", 2, WINDOW, t0 + 40_000).await.0);
        assert!(!limiter.admit_at("ip", 2, WINDOW, t0 + 50_000).await.0);

        // First request has aged out, the second has not.
        assert!(limiter.admit_at("ip", 2, WINDOW, t0 + 60_001).await.0);
        assert!(!limiter.admit_at("ip", 2, WINDOW, t0 + 60_002).await.0);
    }

    #[tokio::test]
    async fn test_info_does_not_mutate() {
        let limiter = limiter();
        let t0 = 4_000_000;

        for _ in 0..5 {
            let info = limiter.info_at("ip", 2, WINDOW, t0).await;
            assert_eq!(info.remaining, 2);
            assert_eq!(info.limit, 2);
            assert_eq!(info.reset_at, t0 + WINDOW as i64);
        }
        assert_eq!(limiter.tracked_identifiers().await, 0);

        limiter.admit_at("ip", 2, WINDOW, t0).await;
        assert_eq!(limiter.info_at("ip", 2, WINDOW, t0 + 1).await.remaining, 1);
        assert_eq!(limiter.info_at("ip", 2, WINDOW, t0 + 1).await.remaining, 1);
    }

    #[tokio::test]
    async fn test_identifiers_are_independent() {
        let limiter = limiter();
        let t0 = 6_000_000;

        assert!(limiter.admit_at("a", 1, WINDOW, t0).await.0);
        assert!(!limiter.admit_at("a", 1, WINDOW, t0 + 1).await.0);
        assert!(limiter.admit_at("b", 1, WINDOW, t0 + 2).await.0);
    }

    #[tokio::test]
    async fn test_least_recently_used_identifier_is_evicted() {
        let limiter = RateLimiter::new(RateLimitConfig {
            max_identifiers: 3,
            ..Default::default()
        });
        let t0 = 7_000_000;

        limiter.admit_at("a", 1, WINDOW, t0).await;
        limiter.admit_at("b", 1, WINDOW, t0 + 1).await;
        limiter.admit_at("c", 1, WINDOW, t0 + 2).await;
        // Touch "a" so "b" becomes the least recently used.
        limiter.admit_at("a", 1, WINDOW, t0 + 3).await;
        limiter.admit_at("d", 1, WINDOW, t0 + 4).await;

        assert_eq!(limiter.tracked_identifiers().await, 3);
        // "b" was forgotten, so it is admitted again.
        assert!(limiter.admit_at("b", 1, WINDOW, t0 + 5).await.0);
        // "a" is still tracked and still limited.
        assert!(!limiter.admit_at("a", 1, WINDOW, t0 + 6).await.0);
    }

    #[tokio::test]
    async fn test_idle_entries_expire() {
        let limiter = RateLimiter::new(RateLimitConfig {
            idle_ttl_secs: 10,
            ..Default::default()
        });
        let t0 = 8_000_000;

        // Window longer than the idle TTL so only expiry can admit again.
        let window = 3_600_000;
        assert!(limiter.admit_at("ip", 1, window, t0).await.0);
        assert!(!limiter.admit_at("ip", 1, window, t0 + 5_000).await.0);
        assert!(limiter.admit_at("ip", 1, window, t0 + 5_000 + 10_000).await.0);
    }

    #[tokio::test]
    async fn test_cleanup_drops_idle_entries() {
        let limiter = RateLimiter::new(RateLimitConfig {
            idle_ttl_secs: 1,
            ..Default::default()
        });
        let t0 = 9_000_000;

        limiter.admit_at("old", 5, WINDOW, t0).await;
        limiter.admit_at("fresh", 5, WINDOW, t0 + 1_500).await;
        limiter.cleanup_at(t0 + 2_000).await;

        assert_eq!(limiter.tracked_identifiers().await, 1);
        assert_eq!(limiter.info_at("fresh", 5, WINDOW, t0 + 2_000).await.remaining, 4);
    }

    #[tokio::test]
    async fn test_concurrent_requests_never_exceed_limit() {
        let limiter = Arc::new(limiter());
        let mut handles = Vec::new();

        for _ in 0..50 {
            let limiter = limiter.clone();
            handles.push(tokio::spawn(async move {
                limiter.allow("shared", 10, WINDOW).await
            }));
        }

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 10);
    }

    #[tokio::test]
    async fn test_check_uses_configured_limit() {
        let limiter = RateLimiter::new(RateLimitConfig {
            max_requests: 2,
            ..Default::default()
        });

        match limiter.check("ip").await {
            RateLimitResult::Allowed { remaining, reset_in } => {
                assert_eq!(remaining, 1);
                assert!(reset_in <= Duration::from_secs(60));
            }
            RateLimitResult::Limited { .. } => panic!("Should not be limited"),
        }
        assert!(limiter.check("ip").await.is_allowed());

        match limiter.check("ip").await {
            RateLimitResult::Limited { retry_after } => {
                assert!(retry_after > Duration::ZERO);
                assert!(retry_after <= Duration::from_secs(60));
            }
            RateLimitResult::Allowed { .. } => panic!("Should be limited"),
        }
        assert_eq!(limiter.check_info("ip").await.remaining, 0);
    }
}
