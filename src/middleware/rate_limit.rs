//! Fixed-window rate limiting keyed by client identity.
//!
//! Counters live in a process-local table owned by `AppState` and injected
//! into the pipeline; the window resets at a fixed boundary rather than
//! sliding, trading burstiness at the edge for O(1) memory per key. Expired
//! keys are evicted lazily on access, there is no timer thread. A race under
//! heavy concurrency may let a count exceed the limit by a small margin;
//! acceptable for abuse mitigation, not exact accounting.

use super::ip::extract_ip_from_headers;
use axum::{
    extract::{connect_info::ConnectInfo, Request, State},
    http::{HeaderValue, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};
use tokio::sync::RwLock;

use crate::config::RateTierConfig;
use crate::error::{AppError, ErrorKind};
use crate::state::AppState;

#[derive(Debug, Clone, Copy)]
struct Entry {
    count: u32,
    /// Epoch millis at which the current window ends.
    window_reset_at: u64,
}

/// Outcome of a budget check, carrying everything the response headers need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { limit: u32, remaining: u32, reset_at_unix: u64 },
    Denied { limit: u32, retry_after_secs: u64, reset_at_unix: u64 },
}

/// A thread-safe fixed-window request counter table.
#[derive(Clone, Default)]
pub struct RateLimiter {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check and consume budget for `key`.
    pub async fn check(&self, key: &str, window_ms: u64, max_requests: u32) -> RateDecision {
        self.check_at(key, window_ms, max_requests, now_millis()).await
    }

    /// Clock-injected variant backing `check`; tests advance `now_ms` instead
    /// of sleeping.
    pub async fn check_at(
        &self,
        key: &str,
        window_ms: u64,
        max_requests: u32,
        now_ms: u64,
    ) -> RateDecision {
        let mut entries = self.entries.write().await;

        // Amortized cleanup: single-pass eviction of every expired key. Key
        // cardinality is low (one per client IP and tier), so a full scan per
        // call is acceptable here.
        entries.retain(|_, e| e.window_reset_at >= now_ms);

        let entry = entries
            .entry(key.to_string())
            .or_insert(Entry { count: 0, window_reset_at: now_ms + window_ms });
        if entry.window_reset_at < now_ms {
            entry.count = 0;
            entry.window_reset_at = now_ms + window_ms;
        }

        let reset_at_unix = entry.window_reset_at.div_ceil(1000);
        if entry.count >= max_requests {
            let retry_after_secs =
                entry.window_reset_at.saturating_sub(now_ms).div_ceil(1000).max(1);
            return RateDecision::Denied { limit: max_requests, retry_after_secs, reset_at_unix };
        }

        entry.count += 1;
        RateDecision::Allowed {
            limit: max_requests,
            remaining: max_requests - entry.count,
            reset_at_unix,
        }
    }

    /// Number of live (non-evicted) keys, for tests and diagnostics.
    pub async fn key_count(&self) -> usize {
        self.entries.read().await.len()
    }
}

/// Policy tiers with distinct key namespaces and budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateTier {
    /// Login/register: strict budget against brute force.
    Auth,
    /// Mutating methods.
    Write,
    /// Everything else.
    Global,
}

impl RateTier {
    pub fn as_str(self) -> &'static str {
        match self {
            RateTier::Auth => "auth",
            RateTier::Write => "write",
            RateTier::Global => "global",
        }
    }
}

/// Select the tier from request path and method, before any auth resolves.
pub fn tier_for(path: &str, method: &Method) -> RateTier {
    if path.starts_with("/login") || path.starts_with("/register") {
        return RateTier::Auth;
    }
    if !matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS) {
        return RateTier::Write;
    }
    RateTier::Global
}

fn set_rate_headers(res: &mut Response, limit: u32, remaining: u32, reset_at_unix: u64) {
    let headers = res.headers_mut();
    headers.insert("x-ratelimit-limit", HeaderValue::from(limit));
    headers.insert("x-ratelimit-remaining", HeaderValue::from(remaining));
    headers.insert("x-ratelimit-reset", HeaderValue::from(reset_at_unix));
}

/// Pipeline stage: reject over-budget clients with 429 before any further
/// work is spent on them, and annotate allowed responses with the remaining
/// budget.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let remote_ip = req.extensions().get::<ConnectInfo<SocketAddr>>().map(|info| info.0.ip());
    let ip = extract_ip_from_headers(req.headers(), remote_ip);

    let tier = tier_for(req.uri().path(), req.method());
    let RateTierConfig { window_secs, max_requests } = match tier {
        RateTier::Auth => state.config.rate_limit.auth,
        RateTier::Write => state.config.rate_limit.write,
        RateTier::Global => state.config.rate_limit.global,
    };
    let key = format!("{}:{}", tier.as_str(), ip);

    match state.rate_limiter.check(&key, window_secs * 1000, max_requests).await {
        RateDecision::Allowed { limit, remaining, reset_at_unix } => {
            let mut res = next.run(req).await;
            set_rate_headers(&mut res, limit, remaining, reset_at_unix);
            res
        }
        RateDecision::Denied { limit, retry_after_secs, reset_at_unix } => {
            state.metrics.inc_requests_rate_limited();
            tracing::warn!("rate limit exceeded for {} (tier {})", ip, tier.as_str());
            let mut res = AppError::new(ErrorKind::TooManyRequests)
                .with_details(serde_json::json!({ "retry_after_seconds": retry_after_secs }))
                .into_response();
            set_rate_headers(&mut res, limit, 0, reset_at_unix);
            res.headers_mut().insert("retry-after", HeaderValue::from(retry_after_secs));
            res
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixed_window_allows_then_denies() {
        let limiter = RateLimiter::new();
        let t0 = 1_000_000;

        for expected_remaining in [2u32, 1, 0] {
            match limiter.check_at("global:1.2.3.4", 60_000, 3, t0).await {
                RateDecision::Allowed { limit, remaining, .. } => {
                    assert_eq!(limit, 3);
                    assert_eq!(remaining, expected_remaining);
                }
                RateDecision::Denied { .. } => panic!("should be allowed"),
            }
        }

        match limiter.check_at("global:1.2.3.4", 60_000, 3, t0 + 1_000).await {
            RateDecision::Denied { retry_after_secs, reset_at_unix, .. } => {
                assert!(retry_after_secs > 0);
                assert_eq!(reset_at_unix, (t0 + 60_000) / 1000);
            }
            RateDecision::Allowed { .. } => panic!("fourth request must be denied"),
        }
    }

    #[tokio::test]
    async fn test_window_expiry_resets_count() {
        let limiter = RateLimiter::new();
        let t0 = 1_000_000;

        for _ in 0..3 {
            limiter.check_at("k", 60_000, 3, t0).await;
        }
        assert!(matches!(
            limiter.check_at("k", 60_000, 3, t0).await,
            RateDecision::Denied { .. }
        ));

        // Past the window boundary the count starts over at 1
        match limiter.check_at("k", 60_000, 3, t0 + 61_000).await {
            RateDecision::Allowed { remaining, .. } => assert_eq!(remaining, 2),
            RateDecision::Denied { .. } => panic!("new window must allow"),
        }
    }

    #[tokio::test]
    async fn test_keys_are_independent_and_evicted() {
        let limiter = RateLimiter::new();
        let t0 = 5_000;

        limiter.check_at("auth:1.1.1.1", 10_000, 1, t0).await;
        limiter.check_at("auth:2.2.2.2", 10_000, 1, t0).await;
        assert_eq!(limiter.key_count().await, 2);
        assert!(matches!(
            limiter.check_at("auth:1.1.1.1", 10_000, 1, t0).await,
            RateDecision::Denied { .. }
        ));

        // A later call evicts both stale keys before inserting its own
        limiter.check_at("auth:3.3.3.3", 10_000, 1, t0 + 20_000).await;
        assert_eq!(limiter.key_count().await, 1);
    }

    #[test]
    fn test_tier_selection() {
        assert_eq!(tier_for("/login", &Method::POST), RateTier::Auth);
        assert_eq!(tier_for("/register", &Method::POST), RateTier::Auth);
        assert_eq!(tier_for("/api/cocktails", &Method::POST), RateTier::Write);
        assert_eq!(tier_for("/api/cocktails/3", &Method::DELETE), RateTier::Write);
        assert_eq!(tier_for("/api/cocktails", &Method::GET), RateTier::Global);
        assert_eq!(tier_for("/api/cocktails", &Method::OPTIONS), RateTier::Global);
    }
}
