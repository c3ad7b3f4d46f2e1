//! Per-client gating: a small token bucket for bursts plus an independent
//! daily cap. State lives in a process-local map keyed by client id, which is
//! explicitly not consistent across multiple instances.

use axum::http::HeaderMap;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::net::SocketAddr;
use utoipa::ToSchema;

#[derive(Debug, Clone)]
struct RateState {
    day_start: DateTime<Utc>,
    day_count: u32,
    tokens: f64,
    last_refill: DateTime<Utc>,
}

/// What is left for this client after a decision, surfaced in the dev debug
/// block.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RateRemaining {
    pub burst_tokens: f64,
    pub daily_remaining: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct RateDecision {
    pub allowed: bool,
    /// Seconds until the binding constraint (next token or day rollover)
    /// clears. Zero when allowed.
    pub retry_after_seconds: u32,
    pub remaining: RateRemaining,
}

pub struct RateLimiter {
    store: DashMap<String, RateState>,
    burst_tokens: f64,
    burst_window: Duration,
    daily_limit: u32,
}

impl RateLimiter {
    pub fn new(burst_tokens: u32, burst_window: Duration, daily_limit: u32) -> Self {
        Self {
            store: DashMap::new(),
            burst_tokens: f64::from(burst_tokens),
            burst_window,
            daily_limit,
        }
    }

    /// Consume one request slot for `client` at `now`. Time is passed in so
    /// callers (and tests) control the clock.
    pub fn acquire(&self, client: &str, now: DateTime<Utc>) -> RateDecision {
        let mut entry = self
            .store
            .entry(client.to_string())
            .or_insert_with(|| RateState {
                day_start: now,
                day_count: 0,
                tokens: self.burst_tokens,
                last_refill: now,
            });
        let state = entry.value_mut();

        // Day rollover: the cap resets 24h after the first request of the
        // current window, not at midnight.
        if now.signed_duration_since(state.day_start) >= Duration::hours(24) {
            state.day_start = now;
            state.day_count = 0;
        }

        let elapsed_ms = now
            .signed_duration_since(state.last_refill)
            .num_milliseconds()
            .max(0) as f64;
        let window_ms = self.burst_window.num_milliseconds() as f64;
        let refill = (elapsed_ms / window_ms) * self.burst_tokens;
        state.tokens = (state.tokens + refill).min(self.burst_tokens);
        state.last_refill = now;

        if state.day_count >= self.daily_limit {
            let reset_at = state.day_start + Duration::hours(24);
            let retry = reset_at.signed_duration_since(now).num_seconds().max(0) as u32;
            return RateDecision {
                allowed: false,
                retry_after_seconds: retry.max(1),
                remaining: RateRemaining {
                    burst_tokens: round2(state.tokens),
                    daily_remaining: 0,
                },
            };
        }

        if state.tokens < 1.0 {
            let seconds_per_token = self.burst_window.num_seconds() as f64 / self.burst_tokens;
            let retry = ((1.0 - state.tokens) * seconds_per_token).ceil() as u32;
            return RateDecision {
                allowed: false,
                retry_after_seconds: retry.max(1),
                remaining: RateRemaining {
                    burst_tokens: round2(state.tokens),
                    daily_remaining: self.daily_limit - state.day_count,
                },
            };
        }

        state.tokens -= 1.0;
        state.day_count += 1;
        RateDecision {
            allowed: true,
            retry_after_seconds: 0,
            remaining: RateRemaining {
                burst_tokens: round2(state.tokens),
                daily_remaining: self.daily_limit.saturating_sub(state.day_count),
            },
        }
    }
}

/// Identify the caller: first X-Forwarded-For entry, then X-Real-Ip, then the
/// socket peer.
pub fn client_id(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next().map(str::trim)
            && !first.is_empty()
        {
            return first.to_string();
        }
    }
    if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        let trimmed = real_ip.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter() -> RateLimiter {
        RateLimiter::new(2, Duration::seconds(60), 30)
    }

    #[test]
    fn third_request_in_a_burst_is_rejected() {
        let limiter = limiter();
        let now = Utc::now();
        assert!(limiter.acquire("1.2.3.4", now).allowed);
        let second = limiter.acquire("1.2.3.4", now + Duration::milliseconds(200));
        assert!(second.allowed);
        let third = limiter.acquire("1.2.3.4", now + Duration::milliseconds(900));
        assert!(!third.allowed);
        assert!(third.retry_after_seconds >= 1);
    }

    #[test]
    fn tokens_refill_continuously() {
        let limiter = limiter();
        let now = Utc::now();
        limiter.acquire("c", now);
        limiter.acquire("c", now);
        assert!(!limiter.acquire("c", now).allowed);
        // Half a window refills one full token.
        assert!(limiter.acquire("c", now + Duration::seconds(31)).allowed);
    }

    #[test]
    fn clients_are_isolated() {
        let limiter = limiter();
        let now = Utc::now();
        limiter.acquire("a", now);
        limiter.acquire("a", now);
        assert!(!limiter.acquire("a", now).allowed);
        assert!(limiter.acquire("b", now).allowed);
    }

    #[test]
    fn daily_cap_binds_independently_of_tokens() {
        let limiter = RateLimiter::new(2, Duration::seconds(60), 3);
        let mut now = Utc::now();
        for _ in 0..3 {
            assert!(limiter.acquire("c", now).allowed);
            now += Duration::minutes(5);
        }
        let rejected = limiter.acquire("c", now);
        assert!(!rejected.allowed);
        assert_eq!(rejected.remaining.daily_remaining, 0);
        // Retry-after points at the window reset, which is most of a day out.
        assert!(rejected.retry_after_seconds > 60 * 60 * 20);
    }

    #[test]
    fn daily_cap_resets_after_24_hours() {
        let limiter = RateLimiter::new(2, Duration::seconds(60), 1);
        let now = Utc::now();
        assert!(limiter.acquire("c", now).allowed);
        assert!(!limiter.acquire("c", now + Duration::hours(1)).allowed);
        assert!(limiter.acquire("c", now + Duration::hours(25)).allowed);
    }

    #[test]
    fn remaining_counters_track_usage() {
        let limiter = limiter();
        let now = Utc::now();
        let first = limiter.acquire("c", now);
        assert_eq!(first.remaining.burst_tokens, 1.0);
        assert_eq!(first.remaining.daily_remaining, 29);
    }

    #[test]
    fn client_id_prefers_forwarded_for_first_entry() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.9, 198.51.100.2".parse().unwrap());
        headers.insert("x-real-ip", "198.51.100.7".parse().unwrap());
        let peer: SocketAddr = "127.0.0.1:9999".parse().unwrap();
        assert_eq!(client_id(&headers, Some(peer)), "203.0.113.9");
    }

    #[test]
    fn client_id_falls_back_to_real_ip_then_peer() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", "198.51.100.7".parse().unwrap());
        let peer: SocketAddr = "10.1.2.3:4567".parse().unwrap();
        assert_eq!(client_id(&headers, Some(peer)), "198.51.100.7");
        assert_eq!(client_id(&HeaderMap::new(), Some(peer)), "10.1.2.3");
        assert_eq!(client_id(&HeaderMap::new(), None), "unknown");
    }
}
