use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::http::HeaderMap;

use crate::error::{AppError, AppResult};

/// Limit applied to one family of endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRule {
    pub limit: u32,
    pub window: Duration,
}

impl RateLimitRule {
    pub fn per_window(limit: u32, window: Duration) -> Self {
        Self { limit, window }
    }
}

/// Outcome of a single rate-limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub retry_after_secs: u64,
}

#[derive(Debug, Clone, Copy)]
struct RateLimitEntry {
    count: u32,
    reset_at: Instant,
}

const SWEEP_THRESHOLD: usize = 4096;

/// Fixed-window request counter keyed by client identity.
///
/// One instance lives for the whole process. There is no background sweep:
/// an expired entry is replaced by a fresh window the next time its key is
/// checked, and once the map grows past a threshold every expired entry is
/// dropped during the check that noticed it.
#[derive(Debug)]
pub struct RateLimiter {
    entries: Mutex<HashMap<String, RateLimitEntry>>,
    sweep_threshold: usize,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::with_sweep_threshold(SWEEP_THRESHOLD)
    }
}

fn ceil_secs(duration: Duration) -> u64 {
    (duration.as_millis() as u64).div_ceil(1000)
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sweep_threshold(sweep_threshold: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            sweep_threshold,
        }
    }

    /// Counts one request against `key` and reports whether it may proceed
    pub fn check(&self, key: &str, rule: RateLimitRule) -> RateLimitDecision {
        self.check_at(key, rule, Instant::now())
    }

    pub fn check_at(&self, key: &str, rule: RateLimitRule, now: Instant) -> RateLimitDecision {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if entries.len() >= self.sweep_threshold && !entries.contains_key(key) {
            let before = entries.len();
            entries.retain(|_, entry| entry.reset_at > now);
            tracing::debug!(
                dropped = before - entries.len(),
                remaining = entries.len(),
                "Swept expired rate-limit entries"
            );
        }

        let entry = entries
            .entry(key.to_string())
            .or_insert(RateLimitEntry {
                count: 0,
                reset_at: now,
            });

        if entry.reset_at <= now {
            *entry = RateLimitEntry {
                count: 1,
                reset_at: now + rule.window,
            };
            return RateLimitDecision {
                allowed: rule.limit > 0,
                remaining: rule.limit.saturating_sub(1),
                retry_after_secs: ceil_secs(rule.window),
            };
        }

        let retry_after_secs = ceil_secs(entry.reset_at - now).max(1);

        if entry.count >= rule.limit {
            return RateLimitDecision {
                allowed: false,
                remaining: 0,
                retry_after_secs,
            };
        }

        entry.count += 1;
        RateLimitDecision {
            allowed: true,
            remaining: rule.limit.saturating_sub(entry.count),
            retry_after_secs,
        }
    }

    /// Like `check`, but turns a rejection into `AppError::RateLimited`
    pub fn enforce(&self, key: &str, rule: RateLimitRule) -> AppResult<RateLimitDecision> {
        let decision = self.check(key, rule);
        if decision.allowed {
            Ok(decision)
        } else {
            tracing::warn!(
                key = %key,
                retry_after_secs = decision.retry_after_secs,
                "Rate limit exceeded"
            );
            Err(AppError::RateLimited {
                retry_after_secs: decision.retry_after_secs,
            })
        }
    }

    pub fn tracked_keys(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

/// Derives the client identity from proxy headers
///
/// Uses the first `x-forwarded-for` hop, then `x-real-ip`, then "unknown".
pub fn client_ip(headers: &HeaderMap) -> String {
    if let Some(forwarded) = headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
    {
        let first = forwarded.split(',').next().unwrap_or_default().trim();
        return if first.is_empty() {
            "unknown".to_string()
        } else {
            first.to_string()
        };
    }

    headers
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .unwrap_or("unknown")
        .to_string()
}
